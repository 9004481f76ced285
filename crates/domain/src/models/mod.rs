//! Domain models.

pub mod inventory;
pub mod invite;
pub mod meeting;
pub mod post;
pub mod project;
pub mod summary;
pub mod user;

pub use inventory::{InventoryError, InventoryItem, Issuance, IssuanceKind};
pub use invite::{InviteCode, InviteState};
pub use meeting::{Meeting, MeetingDetails, MeetingType};
pub use post::Post;
pub use project::{Project, ProjectDetail, ProjectDomain, ProjectStatus, Suggestion};
pub use summary::PageType;
pub use user::{Role, User, UserRef};
