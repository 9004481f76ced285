//! Database entity definitions.
//!
//! Entities are direct mappings to database rows. Joined rows carry the
//! few user columns a listing shows so responses need no second lookup.

pub mod inventory;
pub mod invite_code;
pub mod meeting;
pub mod post;
pub mod project;
pub mod user;

pub use inventory::{InventoryItemEntity, IssuanceEntity, IssuanceKindDb};
pub use invite_code::InviteCodeEntity;
pub use meeting::{MeetingEntity, MeetingTypeDb};
pub use post::{PostEntity, PostLikeEntity};
pub use project::{ProjectDomainDb, ProjectEntity, ProjectStatusDb, SuggestionEntity};
pub use user::{UserContactRow, UserEntity, UserRoleDb, USER_COLUMNS};
