//! Session token utilities (HS256).
//!
//! A session token is a signed JWT whose subject is the user id. Tokens are
//! verified statelessly; there is no server-side session table.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Minimum accepted secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Clock skew tolerated when checking `exp`.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Session secret must be at least {min} bytes")]
    WeakSecret { min: usize },

    #[error("Could not sign session token: {0}")]
    Signing(String),

    #[error("Session token expired")]
    Expired,

    /// Bad signature, malformed token, or a subject that is not a user id.
    #[error("Session token rejected")]
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl SessionClaims {
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::Rejected)
    }
}

/// A freshly signed token and its unique id.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
}

/// Signs and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct JwtConfig {
    signer: EncodingKey,
    verifier: DecodingKey,
    pub token_expiry_secs: i64,
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("token_expiry_secs", &self.token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: &str, token_expiry_secs: i64) -> Result<Self, JwtError> {
        Self::with_leeway(secret, token_expiry_secs, DEFAULT_LEEWAY_SECS)
    }

    pub fn with_leeway(
        secret: &str,
        token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::WeakSecret {
                min: MIN_SECRET_LEN,
            });
        }

        let bytes = secret.as_bytes();
        Ok(Self {
            signer: EncodingKey::from_secret(bytes),
            verifier: DecodingKey::from_secret(bytes),
            token_expiry_secs,
            leeway_secs,
        })
    }

    /// Signs a token for `user_id` valid for `token_expiry_secs`.
    pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken, JwtError> {
        let issued_at = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::seconds(self.token_expiry_secs)).timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.signer)
            .map_err(|e| JwtError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti: claims.jti,
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut rules = Validation::new(Algorithm::HS256);
        rules.leeway = self.leeway_secs;
        rules.set_required_spec_claims(&["exp", "sub"]);

        decode::<SessionClaims>(token, &self.verifier, &rules)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Rejected,
            })
    }
}
