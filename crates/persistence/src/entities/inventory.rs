//! Inventory entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{InventoryItem, Issuance, IssuanceKind, UserRef};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "issuance_kind", rename_all = "lowercase")]
pub enum IssuanceKindDb {
    Issue,
    Return,
}

impl From<IssuanceKindDb> for IssuanceKind {
    fn from(db: IssuanceKindDb) -> Self {
        match db {
            IssuanceKindDb::Issue => IssuanceKind::Issue,
            IssuanceKindDb::Return => IssuanceKind::Return,
        }
    }
}

impl From<IssuanceKind> for IssuanceKindDb {
    fn from(kind: IssuanceKind) -> Self {
        match kind {
            IssuanceKind::Issue => IssuanceKindDb::Issue,
            IssuanceKind::Return => IssuanceKindDb::Return,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InventoryItemEntity {
    pub id: Uuid,
    pub item_name: String,
    pub category: String,
    pub total_quantity: i32,
    pub available_quantity: i32,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItemEntity {
    pub fn into_item(self, issued_to: Vec<Issuance>) -> InventoryItem {
        InventoryItem {
            id: self.id,
            item_name: self.item_name,
            category: self.category,
            total_quantity: self.total_quantity,
            available_quantity: self.available_quantity,
            location: self.location,
            issued_to,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Ledger row joined with the holder's name and college id.
#[derive(Debug, Clone, FromRow)]
pub struct IssuanceEntity {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub college_id: String,
    pub quantity: i32,
    pub project: Option<String>,
    pub kind: IssuanceKindDb,
    pub issue_date: DateTime<Utc>,
}

impl From<IssuanceEntity> for Issuance {
    fn from(entity: IssuanceEntity) -> Self {
        Self {
            id: entity.id,
            user: UserRef {
                college_id: Some(entity.college_id),
                ..UserRef::named(entity.user_id, entity.user_name)
            },
            quantity: entity.quantity,
            project: entity.project,
            kind: entity.kind.into(),
            issue_date: entity.issue_date,
        }
    }
}
