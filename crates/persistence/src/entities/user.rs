//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Role, User, UserRef};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for `user_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "PascalCase")]
pub enum UserRoleDb {
    Admin,
    Head,
    Member,
    Alumni,
}

impl From<UserRoleDb> for Role {
    fn from(db_role: UserRoleDb) -> Self {
        match db_role {
            UserRoleDb::Admin => Role::Admin,
            UserRoleDb::Head => Role::Head,
            UserRoleDb::Member => Role::Member,
            UserRoleDb::Alumni => Role::Alumni,
        }
    }
}

impl From<Role> for UserRoleDb {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => UserRoleDb::Admin,
            Role::Head => UserRoleDb::Head,
            Role::Member => UserRoleDb::Member,
            Role::Alumni => UserRoleDb::Alumni,
        }
    }
}

/// Column list shared by every query returning a full [`UserEntity`].
pub const USER_COLUMNS: &str = "id, name, email, college_id, password_hash, role, is_verified, \
     verification_token_hash, verification_token_expires_at, phone, year, branch, batch, \
     project_ideas, created_at, updated_at";

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub college_id: String,
    pub password_hash: String,
    pub role: UserRoleDb,
    pub is_verified: bool,
    pub verification_token_hash: Option<String>,
    pub verification_token_expires_at: Option<DateTime<Utc>>,
    pub phone: Option<String>,
    pub year: Option<i32>,
    pub branch: Option<String>,
    pub batch: Option<String>,
    pub project_ideas: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            college_id: entity.college_id,
            password_hash: entity.password_hash,
            role: entity.role.into(),
            is_verified: entity.is_verified,
            phone: entity.phone,
            year: entity.year,
            branch: entity.branch,
            batch: entity.batch,
            project_ideas: entity.project_ideas,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Id, name and email of a user joined into another listing.
#[derive(Debug, Clone, FromRow)]
pub struct UserContactRow {
    pub owner_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<UserContactRow> for UserRef {
    fn from(row: UserContactRow) -> Self {
        UserRef {
            email: Some(row.email),
            ..UserRef::named(row.user_id, row.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip_through_db_enum() {
        for role in [Role::Admin, Role::Head, Role::Member, Role::Alumni] {
            let db: UserRoleDb = role.into();
            assert_eq!(Role::from(db), role);
        }
    }

    #[test]
    fn test_contact_row_into_ref() {
        let row = UserContactRow {
            owner_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Asha".to_string(),
            email: "asha@club.org".to_string(),
        };
        let user_id = row.user_id;
        let r: UserRef = row.into();
        assert_eq!(r.id, user_id);
        assert_eq!(r.email.as_deref(), Some("asha@club.org"));
        assert!(r.role.is_none());
    }
}
