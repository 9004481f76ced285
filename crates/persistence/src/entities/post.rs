//! Post entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Post, UserRef};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserRoleDb;

/// Post row joined with its author.
#[derive(Debug, Clone, FromRow)]
pub struct PostEntity {
    pub id: Uuid,
    pub content: String,
    pub post_type: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_role: UserRoleDb,
    pub author_branch: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PostEntity {
    pub fn into_post(self, likes: Vec<Uuid>) -> Post {
        Post {
            id: self.id,
            content: self.content,
            post_type: self.post_type,
            author: UserRef {
                role: Some(self.author_role.into()),
                branch: self.author_branch,
                ..UserRef::named(self.author_id, self.author_name)
            },
            likes,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PostLikeEntity {
    pub post_id: Uuid,
    pub user_id: Uuid,
}
