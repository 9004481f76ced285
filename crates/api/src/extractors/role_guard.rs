//! Role allow-lists enforced at the handler boundary.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::user::allow_list;
use domain::models::{Role, User};
use std::marker::PhantomData;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// A named set of roles admitted to a route.
pub trait AllowList: Send + Sync + 'static {
    const ROLES: &'static [Role];
}

macro_rules! allow_list {
    ($($(#[$meta:meta])* $name:ident => $roles:path;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl AllowList for $name {
                const ROLES: &'static [Role] = $roles;
            }
        )+
    };
}

allow_list! {
    /// Invite generation and sending.
    Inviters => allow_list::INVITERS;
    /// `/api/admin/users`.
    UserAdmins => allow_list::USER_ADMINS;
    ProjectCreators => allow_list::PROJECT_CREATORS;
    ProjectDeleters => allow_list::PROJECT_DELETERS;
    Suggesters => allow_list::SUGGESTERS;
    MeetingOrganizers => allow_list::MEETING_ORGANIZERS;
    /// Inventory add, update and delete.
    InventoryManagers => allow_list::INVENTORY_MANAGERS;
}

/// Authenticated user whose role is in `L`. Anyone else gets 403.
#[derive(Debug, Clone)]
pub struct RoleGuard<L: AllowList> {
    pub user: User,
    _list: PhantomData<L>,
}

impl<L: AllowList> RoleGuard<L> {
    pub fn check(user: User) -> Result<Self, ApiError> {
        if user.role.is_allowed(L::ROLES) {
            Ok(Self {
                user,
                _list: PhantomData,
            })
        } else {
            tracing::info!(user_id = %user.id, role = %user.role, "Role not in allow-list");
            Err(ApiError::Forbidden(format!(
                "User role ({}) is not authorized to access this route",
                user.role
            )))
        }
    }
}

#[async_trait]
impl<L: AllowList> FromRequestParts<AppState> for RoleGuard<L> {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Self::check(user)
    }
}
