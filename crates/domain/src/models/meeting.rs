//! Meetings scheduled by organizers for a set of participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::user::{Role, UserRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeetingType {
    Online,
    Offline,
}

impl MeetingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingType::Online => "Online",
            MeetingType::Offline => "Offline",
        }
    }
}

impl fmt::Display for MeetingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDetails {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub topic: String,
    /// Room name or meeting link.
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub location: String,
    pub agenda: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: Uuid,
    pub title: String,
    pub meeting_type: MeetingType,
    pub details: MeetingDetails,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub participants: Vec<UserRef>,
    pub organized_by: UserRef,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    /// Organizer and Admin may delete.
    pub fn can_delete(&self, user_id: Uuid, role: Role) -> bool {
        role.is_admin() || self.organized_by.id == user_id
    }

    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.organized_by.id == user_id || self.participants.iter().any(|p| p.id == user_id)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_time_window"))]
pub struct CreateMeetingRequest {
    #[validate(
        length(max = 200, message = "Title must be at most 200 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub title: String,

    pub meeting_type: MeetingType,

    #[validate(nested)]
    pub details: MeetingDetails,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    #[serde(default)]
    pub participants: Vec<Uuid>,
}

fn validate_time_window(req: &CreateMeetingRequest) -> Result<(), ValidationError> {
    if req.end_time >= req.start_time {
        Ok(())
    } else {
        let mut err = ValidationError::new("time_window");
        err.message = Some("End time must not be before start time".into());
        Err(err)
    }
}
