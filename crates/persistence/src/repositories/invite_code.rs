//! Repository for registration invite codes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::InviteCodeEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct InviteCodeRepository {
    pool: PgPool,
}

impl InviteCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        code: &str,
        created_by: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<InviteCodeEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_invite_code");
        let result = sqlx::query_as::<_, InviteCodeEntity>(
            r#"
            INSERT INTO invite_codes (code, created_by, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, code, created_by, is_used, used_by, expires_at, created_at
            "#,
        )
        .bind(code)
        .bind(created_by)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<InviteCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invite_code");
        let result = sqlx::query_as::<_, InviteCodeEntity>(
            r#"
            SELECT id, code, created_by, is_used, used_by, expires_at, created_at
            FROM invite_codes
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
