//! Single-use registration invite codes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Default lifetime of a freshly minted code.
pub const DEFAULT_INVITE_EXPIRY_DAYS: i64 = 7;

/// A registration invite code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteCode {
    pub id: Uuid,
    pub code: String,
    pub created_by: Option<Uuid>,
    pub is_used: bool,
    pub used_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Why a code cannot be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteState {
    Redeemable,
    Used,
    Expired,
}

impl InviteCode {
    /// Classifies the code at `now`. A used code reports `Used` even when it
    /// has also expired.
    pub fn state_at(&self, now: DateTime<Utc>) -> InviteState {
        if self.is_used {
            InviteState::Used
        } else if self.expires_at <= now {
            InviteState::Expired
        } else {
            InviteState::Redeemable
        }
    }

    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == InviteState::Redeemable
    }
}

/// Expiry for a code minted at `now`.
pub fn default_expiration(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now + Duration::days(days)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteResponse {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Request to email an existing code to a prospective member.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendInviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub invite_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInviteResponse {
    pub message: String,
    pub email_sent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(is_used: bool, expires_in: Duration) -> InviteCode {
        let now = Utc::now();
        InviteCode {
            id: Uuid::new_v4(),
            code: "AB12CD34".to_string(),
            created_by: Some(Uuid::new_v4()),
            is_used,
            used_by: None,
            expires_at: now + expires_in,
            created_at: now,
        }
    }

    #[test]
    fn test_fresh_code_redeemable() {
        let code = invite(false, Duration::days(7));
        assert_eq!(code.state_at(Utc::now()), InviteState::Redeemable);
        assert!(code.is_redeemable_at(Utc::now()));
    }

    #[test]
    fn test_used_code_rejected() {
        let code = invite(true, Duration::days(7));
        assert_eq!(code.state_at(Utc::now()), InviteState::Used);
    }

    #[test]
    fn test_expired_unused_code_rejected() {
        let code = invite(false, Duration::seconds(-1));
        assert_eq!(code.state_at(Utc::now()), InviteState::Expired);
        assert!(!code.is_redeemable_at(Utc::now()));
    }

    #[test]
    fn test_used_wins_over_expired() {
        let code = invite(true, Duration::days(-1));
        assert_eq!(code.state_at(Utc::now()), InviteState::Used);
    }

    #[test]
    fn test_default_expiration() {
        let now = Utc::now();
        let exp = default_expiration(now, DEFAULT_INVITE_EXPIRY_DAYS);
        assert_eq!((exp - now).num_days(), 7);
    }

    #[test]
    fn test_send_invite_validation() {
        let ok = SendInviteRequest {
            email: "new@club.org".to_string(),
            invite_code: "AB12CD34".to_string(),
        };
        assert!(ok.validate().is_ok());

        let missing_code = SendInviteRequest {
            email: "new@club.org".to_string(),
            invite_code: "".to_string(),
        };
        assert!(missing_code.validate().is_err());
    }
}
