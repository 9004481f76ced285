//! Club projects and their suggestion threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::user::{Role, UserRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectDomain {
    Tech,
    Management,
    #[serde(rename = "PR")]
    Pr,
}

impl ProjectDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectDomain::Tech => "Tech",
            ProjectDomain::Management => "Management",
            ProjectDomain::Pr => "PR",
        }
    }
}

impl FromStr for ProjectDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tech" => Ok(ProjectDomain::Tech),
            "management" => Ok(ProjectDomain::Management),
            "pr" => Ok(ProjectDomain::Pr),
            _ => Err(format!("Invalid project domain: {}", s)),
        }
    }
}

impl fmt::Display for ProjectDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProjectStatus {
    #[default]
    Ongoing,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Ongoing => "Ongoing",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Archived => "Archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A project row without its populated relations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub domain: ProjectDomain,
    pub lead_id: Option<Uuid>,
    pub status: ProjectStatus,
    /// Cleared if the creator account is removed.
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creator and Admin may edit status, team and description.
    pub fn can_edit(&self, user_id: Uuid, role: Role) -> bool {
        role.is_admin() || self.created_by == Some(user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: Uuid,
    pub text: String,
    pub author: UserRef,
    pub created_at: DateTime<Utc>,
}

/// Project with lead, team and suggestions populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub domain: ProjectDomain,
    pub status: ProjectStatus,
    /// `None` once the lead account has been removed.
    pub lead: Option<UserRef>,
    pub team: Vec<UserRef>,
    /// Newest first.
    pub suggestions: Vec<Suggestion>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(
        length(max = 200, message = "Title must be at most 200 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub title: String,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub description: String,

    pub domain: ProjectDomain,

    /// Defaults to the creator when absent.
    pub lead: Option<Uuid>,

    #[serde(default)]
    pub team: Vec<Uuid>,

    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(
        length(max = 200, message = "Title must be at most 200 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub title: Option<String>,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub description: Option<String>,

    pub domain: Option<ProjectDomain>,
    pub lead: Option<Uuid>,
    pub team: Option<Vec<Uuid>>,
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddSuggestionRequest {
    #[validate(
        length(max = 2000, message = "Suggestion must be at most 2000 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub text: String,
}

/// Removes duplicate member ids while keeping first-seen order.
pub fn dedup_team(team: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    team.iter().copied().filter(|id| seen.insert(*id)).collect()
}
