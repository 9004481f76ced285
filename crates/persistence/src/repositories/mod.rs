//! Repository implementations for database operations.

pub mod inventory;
pub mod invite_code;
pub mod meeting;
pub mod post;
pub mod project;
pub mod user;

pub use inventory::{InventoryRepository, ItemChanges, NewItem, StockChangeError};
pub use invite_code::InviteCodeRepository;
pub use meeting::{MeetingRepository, NewMeeting};
pub use post::PostRepository;
pub use project::{NewProject, ProjectChanges, ProjectRepository};
pub use user::{DuplicateField, NewUser, UserChanges, UserRepository};
