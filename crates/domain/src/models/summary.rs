//! Prompt composition for AI page summaries.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::meeting::Meeting;
use super::project::ProjectDetail;

pub const SUMMARY_PROMPT_PREFIX: &str =
    "Provide a concise, one-paragraph summary of the following: ";

/// Returned when the model answers without any candidate text.
pub const FALLBACK_SUMMARY: &str = "Sorry, I couldn't generate a summary for this.";

/// India Standard Time, UTC+05:30.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Project,
    Meeting,
}

impl FromStr for PageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(PageType::Project),
            "meeting" => Ok(PageType::Meeting),
            _ => Err("Invalid page type.".to_string()),
        }
    }
}

/// `pageType` stays a string so an unknown value maps to a 400 with the
/// expected message instead of a body rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    pub page_type: String,
    pub page_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

pub fn describe_project(project: &ProjectDetail) -> String {
    let team = project
        .team
        .iter()
        .map(|m| m.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let lead = project
        .lead
        .as_ref()
        .map(|l| l.name.as_str())
        .unwrap_or("Unassigned");
    format!(
        "Project Title: {}. Description: {}. Lead by: {}. Team members: {}. Status: {}.",
        project.title, project.description, lead, team, project.status
    )
}

pub fn describe_meeting(meeting: &Meeting) -> String {
    format!(
        "Meeting: {}. Type: {}. Topic: {}. Organized by: {}. Scheduled for: {}.",
        meeting.title,
        meeting.meeting_type,
        meeting.details.topic,
        meeting.organized_by.name,
        format_ist(meeting.start_time)
    )
}

/// Wraps a page description in the summarization instruction.
pub fn build_prompt(description: &str) -> String {
    format!("{}{}", SUMMARY_PROMPT_PREFIX, description)
}

fn format_ist(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => at
            .with_timezone(&ist)
            .format("%d/%m/%Y, %I:%M %p IST")
            .to_string(),
        None => at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::meeting::{MeetingDetails, MeetingType};
    use crate::models::project::{ProjectDomain, ProjectStatus};
    use crate::models::user::UserRef;
    use chrono::TimeZone;

    #[test]
    fn test_page_type_parse() {
        assert_eq!(PageType::from_str("project").unwrap(), PageType::Project);
        assert_eq!(PageType::from_str("meeting").unwrap(), PageType::Meeting);
        assert_eq!(PageType::from_str("post").unwrap_err(), "Invalid page type.");
    }

    #[test]
    fn test_describe_project() {
        let now = Utc::now();
        let project = ProjectDetail {
            id: Uuid::new_v4(),
            title: "Rover".to_string(),
            description: "Mars rover replica".to_string(),
            domain: ProjectDomain::Tech,
            status: ProjectStatus::Ongoing,
            lead: Some(UserRef::named(Uuid::new_v4(), "Asha")),
            team: vec![
                UserRef::named(Uuid::new_v4(), "Ravi"),
                UserRef::named(Uuid::new_v4(), "Meera"),
            ],
            suggestions: vec![],
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            describe_project(&project),
            "Project Title: Rover. Description: Mars rover replica. Lead by: Asha. \
             Team members: Ravi, Meera. Status: Ongoing."
        );
    }

    #[test]
    fn test_describe_meeting_in_ist() {
        let start = Utc.with_ymd_and_hms(2024, 8, 1, 10, 0, 0).unwrap();
        let meeting = Meeting {
            id: Uuid::new_v4(),
            title: "Kickoff".to_string(),
            meeting_type: MeetingType::Online,
            details: MeetingDetails {
                topic: "Season plan".to_string(),
                location: "https://meet.example/k".to_string(),
                agenda: None,
            },
            start_time: start,
            end_time: start,
            participants: vec![],
            organized_by: UserRef::named(Uuid::new_v4(), "Dev"),
            created_at: start,
        };
        let text = describe_meeting(&meeting);
        assert!(text.starts_with("Meeting: Kickoff. Type: Online. Topic: Season plan."));
        assert!(text.contains("Organized by: Dev."));
        assert!(text.contains("01/08/2024, 03:30 PM IST"));
    }

    #[test]
    fn test_build_prompt() {
        assert_eq!(
            build_prompt("Meeting: X."),
            "Provide a concise, one-paragraph summary of the following: Meeting: X."
        );
    }
}
