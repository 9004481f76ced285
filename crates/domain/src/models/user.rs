//! Club member accounts and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Club role of a user.
///
/// Serialized with the capitalized names clients already use (`"Admin"`).
/// The legacy `"User"` label is accepted as an alias for `Member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    Admin,
    Head,
    #[default]
    #[serde(alias = "User")]
    Member,
    Alumni,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Head => "Head",
            Role::Member => "Member",
            Role::Alumni => "Alumni",
        }
    }

    /// The one authorization decision: is this role on the allow-list?
    pub fn is_allowed(&self, allow_list: &[Role]) -> bool {
        allow_list.contains(self)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "head" => Ok(Role::Head),
            "member" | "user" => Ok(Role::Member),
            "alumni" => Ok(Role::Alumni),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named allow-lists used by route guards.
pub mod allow_list {
    use super::Role;

    pub const INVITERS: &[Role] = &[Role::Admin, Role::Head];
    pub const USER_ADMINS: &[Role] = &[Role::Admin];
    pub const PROJECT_CREATORS: &[Role] = &[Role::Admin, Role::Head];
    pub const PROJECT_DELETERS: &[Role] = &[Role::Admin];
    pub const SUGGESTERS: &[Role] = &[Role::Admin, Role::Head, Role::Alumni];
    pub const MEETING_ORGANIZERS: &[Role] = &[Role::Admin, Role::Head];
    pub const INVENTORY_MANAGERS: &[Role] = &[Role::Admin];
}

/// A registered club member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub college_id: String,
    #[serde(skip_serializing, default)] // Never serialize password hash to API responses
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub phone: Option<String>,
    pub year: Option<i32>,
    pub branch: Option<String>,
    pub batch: Option<String>,
    #[serde(default)]
    pub project_ideas: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact reference to a user embedded in other resources.
///
/// Only the fields a given listing needs are filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college_id: Option<String>,
}

impl UserRef {
    pub fn named(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            role: None,
            branch: None,
            college_id: None,
        }
    }
}

/// Registration payload. The invite code gates account creation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(
        length(max = 100, message = "Name must be at most 100 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(custom(function = "shared::validation::validate_college_id"))]
    pub college_id: String,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub invite_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response for register and login.
///
/// `token` is absent when the account still awaits email verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Self-service profile update.
///
/// Absent, `null` and empty-string fields are left untouched, and `year` may
/// arrive as a numeric string, matching what the profile form posts.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "shared::lenient::blank_as_none")]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "shared::lenient::blank_as_none")]
    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "shared::lenient::optional_i32")]
    #[validate(custom(function = "shared::validation::validate_year"))]
    pub year: Option<i32>,

    #[serde(default, deserialize_with = "shared::lenient::blank_as_none")]
    #[validate(length(max = 50, message = "Branch must be at most 50 characters"))]
    pub branch: Option<String>,

    #[serde(default, deserialize_with = "shared::lenient::blank_as_none")]
    #[validate(custom(function = "shared::validation::validate_batch"))]
    pub batch: Option<String>,

    #[validate(length(max = 20, message = "At most 20 project ideas"))]
    pub project_ideas: Option<Vec<String>>,
}

/// Admin update of any user. `role` stays a string so an unknown label
/// yields a readable 400 instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub role: Option<String>,

    #[validate(custom(function = "shared::validation::validate_college_id"))]
    pub college_id: Option<String>,

    #[serde(default, deserialize_with = "shared::lenient::blank_as_none")]
    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "shared::lenient::optional_i32")]
    #[validate(custom(function = "shared::validation::validate_year"))]
    pub year: Option<i32>,

    #[serde(default, deserialize_with = "shared::lenient::blank_as_none")]
    pub branch: Option<String>,

    #[serde(default, deserialize_with = "shared::lenient::blank_as_none")]
    #[validate(custom(function = "shared::validation::validate_batch"))]
    pub batch: Option<String>,

    pub project_ideas: Option<Vec<String>>,
}

impl AdminUpdateUserRequest {
    /// Parses the requested role, if any.
    pub fn parsed_role(&self) -> Result<Option<Role>, String> {
        self.role.as_deref().map(Role::from_str).transpose()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub data: Vec<User>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            name: Name().fake(),
            email: SafeEmail().fake(),
            password: "secret1".to_string(),
            college_id: "21CS042".to_string(),
            invite_code: "AB12CD34".to_string(),
        }
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("HEAD").unwrap(), Role::Head);
        assert_eq!(Role::from_str("Member").unwrap(), Role::Member);
        assert_eq!(Role::from_str("User").unwrap(), Role::Member);
        assert_eq!(Role::from_str("alumni").unwrap(), Role::Alumni);
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Head).unwrap(), "\"Head\"");
        let legacy: Role = serde_json::from_str("\"User\"").unwrap();
        assert_eq!(legacy, Role::Member);
        assert_eq!(Role::default(), Role::Member);
    }

    #[test]
    fn test_is_allowed() {
        use allow_list::*;

        assert!(Role::Admin.is_allowed(INVITERS));
        assert!(Role::Head.is_allowed(INVITERS));
        assert!(!Role::Member.is_allowed(INVITERS));
        assert!(!Role::Alumni.is_allowed(INVITERS));

        assert!(Role::Admin.is_allowed(USER_ADMINS));
        assert!(!Role::Head.is_allowed(USER_ADMINS));

        assert!(Role::Alumni.is_allowed(SUGGESTERS));
        assert!(!Role::Member.is_allowed(SUGGESTERS));

        assert!(!Role::Head.is_allowed(INVENTORY_MANAGERS));
        assert!(!Role::Admin.is_allowed(&[]));
    }

    #[test]
    fn test_user_serialization_hides_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            college_id: "21CS042".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            role: Role::Member,
            is_verified: true,
            phone: None,
            year: Some(2),
            branch: None,
            batch: None,
            project_ideas: vec![],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["collegeId"], "21CS042");
        assert_eq!(json["isVerified"], true);
        assert_eq!(json["role"], "Member");
    }

    #[test]
    fn test_user_ref_skips_missing_fields() {
        let r = UserRef::named(Uuid::nil(), "Ravi");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["name"], "Ravi");
        assert!(json.get("email").is_none());
        assert!(json.get("role").is_none());
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register_request().validate().is_ok());

        let mut short = register_request();
        short.password = "12345".to_string();
        assert!(short.validate().is_err());

        let mut bad_email = register_request();
        bad_email.email = "not-an-email".to_string();
        assert!(bad_email.validate().is_err());

        let mut blank_invite = register_request();
        blank_invite.invite_code = "  ".to_string();
        assert!(blank_invite.validate().is_err());
    }

    #[test]
    fn test_register_request_camel_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"name":"A","email":"a@b.co","password":"secret1","collegeId":"21CS1","inviteCode":"AB12CD34"}"#,
        )
        .unwrap();
        assert_eq!(req.college_id, "21CS1");
        assert_eq!(req.invite_code, "AB12CD34");
    }

    #[test]
    fn test_update_profile_validation() {
        let ok = UpdateProfileRequest {
            phone: Some("9876543210".to_string()),
            year: Some(3),
            batch: Some("2021-2025".to_string()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad_phone = UpdateProfileRequest {
            phone: Some("12".to_string()),
            ..Default::default()
        };
        assert!(bad_phone.validate().is_err());

        let bad_year = UpdateProfileRequest {
            year: Some(9),
            ..Default::default()
        };
        assert!(bad_year.validate().is_err());
    }

    #[test]
    fn test_update_profile_accepts_form_strings() {
        let req: UpdateProfileRequest = serde_json::from_str(
            r#"{"name":"Asha Rao","phone":"","year":"3","branch":"ECE","batch":""}"#,
        )
        .unwrap();
        assert_eq!(req.name.as_deref(), Some("Asha Rao"));
        assert_eq!(req.year, Some(3));
        assert_eq!(req.branch.as_deref(), Some("ECE"));
        assert!(req.phone.is_none());
        assert!(req.batch.is_none());
        assert!(req.validate().is_ok());

        let untouched: UpdateProfileRequest =
            serde_json::from_str(r#"{"name":"","phone":"","year":"","branch":"","batch":""}"#)
                .unwrap();
        assert!(untouched.name.is_none() && untouched.year.is_none());
        assert!(untouched.validate().is_ok());
    }

    #[test]
    fn test_admin_update_parsed_role() {
        let req = AdminUpdateUserRequest {
            role: Some("head".to_string()),
            ..Default::default()
        };
        assert_eq!(req.parsed_role().unwrap(), Some(Role::Head));

        let none = AdminUpdateUserRequest::default();
        assert_eq!(none.parsed_role().unwrap(), None);

        let bad = AdminUpdateUserRequest {
            role: Some("owner".to_string()),
            ..Default::default()
        };
        assert!(bad.parsed_role().is_err());
    }
}
