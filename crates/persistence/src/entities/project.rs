//! Project entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Project, ProjectDetail, ProjectDomain, ProjectStatus, Suggestion, UserRef};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserRoleDb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "project_domain", rename_all = "PascalCase")]
pub enum ProjectDomainDb {
    Tech,
    Management,
    #[sqlx(rename = "PR")]
    Pr,
}

impl From<ProjectDomainDb> for ProjectDomain {
    fn from(db: ProjectDomainDb) -> Self {
        match db {
            ProjectDomainDb::Tech => ProjectDomain::Tech,
            ProjectDomainDb::Management => ProjectDomain::Management,
            ProjectDomainDb::Pr => ProjectDomain::Pr,
        }
    }
}

impl From<ProjectDomain> for ProjectDomainDb {
    fn from(domain: ProjectDomain) -> Self {
        match domain {
            ProjectDomain::Tech => ProjectDomainDb::Tech,
            ProjectDomain::Management => ProjectDomainDb::Management,
            ProjectDomain::Pr => ProjectDomainDb::Pr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "PascalCase")]
pub enum ProjectStatusDb {
    Ongoing,
    Completed,
    Archived,
}

impl From<ProjectStatusDb> for ProjectStatus {
    fn from(db: ProjectStatusDb) -> Self {
        match db {
            ProjectStatusDb::Ongoing => ProjectStatus::Ongoing,
            ProjectStatusDb::Completed => ProjectStatus::Completed,
            ProjectStatusDb::Archived => ProjectStatus::Archived,
        }
    }
}

impl From<ProjectStatus> for ProjectStatusDb {
    fn from(status: ProjectStatus) -> Self {
        match status {
            ProjectStatus::Ongoing => ProjectStatusDb::Ongoing,
            ProjectStatus::Completed => ProjectStatusDb::Completed,
            ProjectStatus::Archived => ProjectStatusDb::Archived,
        }
    }
}

/// Project row joined with its lead's name and email.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectEntity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub domain: ProjectDomainDb,
    pub lead_id: Option<Uuid>,
    pub lead_name: Option<String>,
    pub lead_email: Option<String>,
    pub status: ProjectStatusDb,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ProjectEntity> for Project {
    fn from(entity: &ProjectEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title.clone(),
            description: entity.description.clone(),
            domain: entity.domain.into(),
            lead_id: entity.lead_id,
            status: entity.status.into(),
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl ProjectEntity {
    /// Builds the populated view from this row plus its team and suggestions.
    pub fn into_detail(self, team: Vec<UserRef>, suggestions: Vec<Suggestion>) -> ProjectDetail {
        let lead = match (self.lead_id, self.lead_name) {
            (Some(id), Some(name)) => Some(UserRef {
                email: self.lead_email,
                ..UserRef::named(id, name)
            }),
            _ => None,
        };
        ProjectDetail {
            id: self.id,
            title: self.title,
            description: self.description,
            domain: self.domain.into(),
            status: self.status.into(),
            lead,
            team,
            suggestions,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Suggestion row joined with its author.
#[derive(Debug, Clone, FromRow)]
pub struct SuggestionEntity {
    pub id: Uuid,
    pub project_id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_role: UserRoleDb,
    pub created_at: DateTime<Utc>,
}

impl From<SuggestionEntity> for Suggestion {
    fn from(entity: SuggestionEntity) -> Self {
        Self {
            id: entity.id,
            text: entity.text,
            author: UserRef {
                role: Some(entity.author_role.into()),
                ..UserRef::named(entity.author_id, entity.author_name)
            },
            created_at: entity.created_at,
        }
    }
}
