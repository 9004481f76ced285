//! Invite code entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::InviteCode;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct InviteCodeEntity {
    pub id: Uuid,
    pub code: String,
    pub created_by: Option<Uuid>,
    pub is_used: bool,
    pub used_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<InviteCodeEntity> for InviteCode {
    fn from(entity: InviteCodeEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            created_by: entity.created_by,
            is_used: entity.is_used,
            used_by: entity.used_by,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
        }
    }
}
