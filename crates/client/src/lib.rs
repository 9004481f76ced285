//! Typed client for the CICR Connect API.
//!
//! [`SessionManager`] owns the signed-in session and its persistence;
//! [`ApiClient`] attaches it to every request and drops it on a 401.

pub mod api;
pub mod session;

pub use api::{ApiClient, ClientError, RegisterOutcome};
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionManager, SessionStore, StoreError,
};
