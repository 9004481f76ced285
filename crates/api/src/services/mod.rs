//! Services wrapping business flows and outbound collaborators.

pub mod auth;
pub mod email;
pub mod summarizer;

pub use auth::{AuthError, AuthService, Registration};
pub use email::{EmailError, EmailMessage, EmailService, Mailer};
pub use summarizer::{GeminiSummarizer, SummarizeError, Summarizer};
