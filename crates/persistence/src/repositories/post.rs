//! Repository for community posts and likes.

use domain::models::post::toggle_like;
use domain::models::Post;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::entities::{PostEntity, PostLikeEntity};
use crate::metrics::QueryTimer;

const POST_SELECT: &str = r#"
    SELECT p.id, p.content, p.post_type, p.author_id,
           u.name AS author_name, u.role AS author_role, u.branch AS author_branch,
           p.created_at
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The feed, newest first.
    pub async fn list(&self) -> Result<Vec<Post>, sqlx::Error> {
        let timer = QueryTimer::new("list_posts");
        let sql = format!("{POST_SELECT} ORDER BY p.created_at DESC, p.id DESC");
        let posts = sqlx::query_as::<_, PostEntity>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let mut likes = self.likes_for(&ids).await?;
        timer.record();

        Ok(posts
            .into_iter()
            .map(|p| {
                let liked_by = likes.remove(&p.id).unwrap_or_default();
                p.into_post(liked_by)
            })
            .collect())
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        let timer = QueryTimer::new("find_post");
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        let post = sqlx::query_as::<_, PostEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(post) = post else {
            timer.record();
            return Ok(None);
        };
        let liked_by = self.likes_for(&[id]).await?.remove(&id).unwrap_or_default();
        timer.record();
        Ok(Some(post.into_post(liked_by)))
    }

    pub async fn create(
        &self,
        author_id: Uuid,
        content: &str,
        post_type: &str,
    ) -> Result<Uuid, sqlx::Error> {
        let timer = QueryTimer::new("create_post");
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO posts (content, post_type, author_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(content)
        .bind(post_type)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(id)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_post");
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Removes the user's like if present, adds it otherwise.
    ///
    /// Returns the updated post, or `None` when the post does not exist.
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        let timer = QueryTimer::new("toggle_post_like");
        let mut tx = self.pool.begin().await?;

        // Row lock serializes toggles on the same post.
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        let mut likes: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM post_likes WHERE post_id = $1 ORDER BY created_at",
        )
        .bind(post_id)
        .fetch_all(&mut *tx)
        .await?;

        if toggle_like(&mut likes, user_id) {
            sqlx::query("INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        timer.record();
        debug!(%post_id, %user_id, like_count = likes.len(), "Post like toggled");
        self.find(post_id).await
    }

    async fn likes_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Uuid>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PostLikeEntity>(
            r#"
            SELECT post_id, user_id
            FROM post_likes
            WHERE post_id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut likes: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in rows {
            likes.entry(row.post_id).or_default().push(row.user_id);
        }
        Ok(likes)
    }
}
