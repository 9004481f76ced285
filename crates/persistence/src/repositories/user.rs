//! Repository for user accounts.

use chrono::{DateTime, Utc};
use domain::models::Role;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{UserEntity, UserRoleDb, USER_COLUMNS};
use crate::metrics::QueryTimer;

/// Which unique field an existing account already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Email,
    CollegeId,
}

/// Input for account creation.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub college_id: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub is_verified: bool,
    pub verification_token_hash: Option<&'a str>,
    pub verification_token_expires_at: Option<DateTime<Utc>>,
}

/// Partial update of a user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub college_id: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub year: Option<i32>,
    pub branch: Option<String>,
    pub batch: Option<String>,
    pub project_ideas: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Emails are stored lowercased; callers pass the normalized form.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Reports whether the email or college id is already taken.
    /// Email wins when both collide.
    pub async fn find_duplicate(
        &self,
        email: &str,
        college_id: &str,
    ) -> Result<Option<DuplicateField>, sqlx::Error> {
        let timer = QueryTimer::new("find_duplicate_user");
        let row: Option<(bool,)> = sqlx::query_as(
            r#"
            SELECT email = $1 AS email_taken
            FROM users
            WHERE email = $1 OR college_id = $2
            ORDER BY (email = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(college_id)
        .fetch_optional(&self.pool)
        .await?;
        timer.record();

        Ok(row.map(|(email_taken,)| {
            if email_taken {
                DuplicateField::Email
            } else {
                DuplicateField::CollegeId
            }
        }))
    }

    /// Creates the user and consumes the invite code in one transaction.
    ///
    /// The claim is conditional on the code being unused and unexpired, so of
    /// two concurrent registrations on the same code at most one commits.
    /// Returns `None` when the code could not be claimed.
    pub async fn create_with_invite(
        &self,
        new_user: &NewUser<'_>,
        invite_code: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_user_with_invite");
        let mut tx = self.pool.begin().await?;

        let insert = format!(
            r#"
            INSERT INTO users (name, email, college_id, password_hash, role, is_verified,
                               verification_token_hash, verification_token_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, UserEntity>(&insert)
            .bind(new_user.name)
            .bind(new_user.email)
            .bind(new_user.college_id)
            .bind(new_user.password_hash)
            .bind(UserRoleDb::from(new_user.role))
            .bind(new_user.is_verified)
            .bind(new_user.verification_token_hash)
            .bind(new_user.verification_token_expires_at)
            .fetch_one(&mut *tx)
            .await?;

        let claimed = sqlx::query(
            r#"
            UPDATE invite_codes
            SET is_used = true, used_by = $2
            WHERE code = $1 AND is_used = false AND expires_at > NOW()
            "#,
        )
        .bind(invite_code)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        tx.commit().await?;
        timer.record();
        Ok(Some(user))
    }

    /// Marks the user owning an unexpired token hash as verified and clears
    /// the token, making it single-use.
    pub async fn verify_email(&self, token_hash: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("verify_user_email");
        let sql = format!(
            r#"
            UPDATE users
            SET is_verified = true,
                verification_token_hash = NULL,
                verification_token_expires_at = NULL,
                updated_at = NOW()
            WHERE verification_token_hash = $1
              AND verification_token_expires_at > NOW()
            RETURNING {USER_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Lists all users, newest first.
    pub async fn list(&self) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Applies a partial update and returns the new row.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &UserChanges,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user");
        let sql = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                college_id = COALESCE($4, college_id),
                role = COALESCE($5, role),
                phone = COALESCE($6, phone),
                year = COALESCE($7, year),
                branch = COALESCE($8, branch),
                batch = COALESCE($9, batch),
                project_ideas = COALESCE($10, project_ideas),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.email.as_deref())
            .bind(changes.college_id.as_deref())
            .bind(changes.role.map(UserRoleDb::from))
            .bind(changes.phone.as_deref())
            .bind(changes.year)
            .bind(changes.branch.as_deref())
            .bind(changes.batch.as_deref())
            .bind(changes.project_ideas.as_deref())
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Deletes a user. Returns false when no such user exists.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_user");
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Counts how many of `ids` belong to existing users.
    pub async fn count_existing(&self, ids: &[Uuid]) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_existing_users");
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(&self.pool)
            .await?;
        timer.record();
        Ok(count)
    }
}
