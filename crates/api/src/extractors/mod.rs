//! Request extractors.

pub mod current_user;
pub mod json;
pub mod role_guard;

pub use current_user::CurrentUser;
pub use json::ApiJson;
pub use role_guard::{
    AllowList, InventoryManagers, Inviters, MeetingOrganizers, ProjectCreators, ProjectDeleters,
    RoleGuard, Suggesters, UserAdmins,
};
