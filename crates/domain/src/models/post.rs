//! Community feed posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::{Role, UserRef};

pub const DEFAULT_POST_TYPE: &str = "General";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub author: UserRef,
    /// Ids of users who liked the post. A set: no duplicates.
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Author and Admin may delete.
    pub fn can_delete(&self, user_id: Uuid, role: Role) -> bool {
        role.is_admin() || self.author.id == user_id
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }
}

/// Adds `user_id` to `likes` if absent, removes it if present.
///
/// Returns whether the user likes the post afterwards.
pub fn toggle_like(likes: &mut Vec<Uuid>, user_id: Uuid) -> bool {
    if let Some(pos) = likes.iter().position(|id| *id == user_id) {
        likes.remove(pos);
        false
    } else {
        likes.push(user_id);
        true
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(
        length(max = 5000, message = "Content must be at most 5000 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub content: String,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 30, message = "Type must be 1 to 30 characters"))]
    pub post_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_like_is_involution() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let original = vec![bob];

        let mut likes = original.clone();
        assert!(toggle_like(&mut likes, alice));
        assert_eq!(likes, vec![bob, alice]);
        assert!(!toggle_like(&mut likes, alice));
        assert_eq!(likes, original);
    }

    #[test]
    fn test_toggle_removes_existing_like() {
        let alice = Uuid::new_v4();
        let mut likes = vec![alice];
        assert!(!toggle_like(&mut likes, alice));
        assert!(likes.is_empty());
    }

    #[test]
    fn test_delete_rights() {
        let author = Uuid::new_v4();
        let post = Post {
            id: Uuid::new_v4(),
            content: "Soldering workshop on Friday".to_string(),
            post_type: DEFAULT_POST_TYPE.to_string(),
            author: UserRef::named(author, "Author"),
            likes: vec![],
            created_at: Utc::now(),
        };
        assert!(post.can_delete(author, Role::Member));
        assert!(post.can_delete(Uuid::new_v4(), Role::Admin));
        assert!(!post.can_delete(Uuid::new_v4(), Role::Head));
    }

    #[test]
    fn test_type_field_name() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"content":"Hello","type":"Announcement"}"#).unwrap();
        assert_eq!(req.post_type.as_deref(), Some("Announcement"));
        assert!(req.validate().is_ok());

        let blank = CreatePostRequest {
            content: "\n".to_string(),
            post_type: None,
        };
        assert!(blank.validate().is_err());
    }
}
