//! Inventory routes: stock management and issuance.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use domain::models::inventory::{
    AddItemRequest, InventoryCapabilities, IssueItemRequest, ReturnItemRequest,
    StockChangeResponse, UpdateItemRequest,
};
use domain::models::{InventoryError, InventoryItem};
use persistence::repositories::{InventoryRepository, ItemChanges, NewItem};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiJson, CurrentUser, InventoryManagers, RoleGuard};
use crate::middleware::metrics::record_items_issued;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items))
        .route("/capabilities", get(capabilities))
        .route("/add", post(add_item))
        .route("/issue", post(issue_item))
        .route("/return", post(return_item))
        .route("/:id", put(update_item).delete(delete_item))
}

/// Every item with its issuance ledger.
///
/// GET /api/inventory
async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let items = InventoryRepository::new(state.pool.clone()).list().await?;
    Ok(Json(items))
}

/// Which optional inventory features this deployment has switched on.
///
/// GET /api/inventory/capabilities
async fn capabilities(State(state): State<AppState>) -> Json<InventoryCapabilities> {
    Json(InventoryCapabilities {
        returns_enabled: state.config.inventory.returns_enabled,
    })
}

/// Add an item with every unit available.
///
/// POST /api/inventory/add
///
/// Requires Admin.
async fn add_item(
    State(state): State<AppState>,
    guard: RoleGuard<InventoryManagers>,
    ApiJson(request): ApiJson<AddItemRequest>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    request.validate()?;

    let item = InventoryRepository::new(state.pool.clone())
        .create(&NewItem {
            item_name: request.item_name.trim(),
            category: request.category.trim(),
            total_quantity: request.total_quantity,
            location: request.location.as_deref(),
        })
        .await?;

    info!(item_id = %item.id, user_id = %guard.user.id, "Inventory item added");
    Ok((StatusCode::CREATED, Json(item)))
}

/// Edit an item.
///
/// PUT /api/inventory/:id
///
/// Requires Admin. A new `totalQuantity` shifts available stock by the same
/// amount and may not drop below the units currently issued.
async fn update_item(
    State(state): State<AppState>,
    guard: RoleGuard<InventoryManagers>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateItemRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    request.validate()?;

    let changes = ItemChanges {
        item_name: request.item_name.map(|n| n.trim().to_string()),
        category: request.category.map(|c| c.trim().to_string()),
        total_quantity: request.total_quantity,
        location: request.location,
    };

    let item = InventoryRepository::new(state.pool.clone())
        .update(id, &changes)
        .await?;

    info!(item_id = %id, user_id = %guard.user.id, "Inventory item updated");
    Ok(Json(item))
}

/// Remove an item and its ledger.
///
/// DELETE /api/inventory/:id
///
/// Requires Admin.
async fn delete_item(
    State(state): State<AppState>,
    guard: RoleGuard<InventoryManagers>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let deleted = InventoryRepository::new(state.pool.clone()).delete(id).await?;
    if !deleted {
        return Err(InventoryError::ItemNotFound.into());
    }

    info!(item_id = %id, user_id = %guard.user.id, "Inventory item removed");
    Ok(Json(json!({ "message": "Item removed" })))
}

/// Take units out of stock.
///
/// POST /api/inventory/issue
///
/// Requires a session. Over-issues are rejected and leave the item untouched;
/// concurrent issues of the same item are serialized.
async fn issue_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<IssueItemRequest>,
) -> Result<Json<StockChangeResponse>, ApiError> {
    request.validate()?;

    // A blank project label is stored as none
    let project = request
        .project
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let item = InventoryRepository::new(state.pool.clone())
        .issue(request.item_id, user.id, request.quantity, project)
        .await?;

    record_items_issued(request.quantity);
    info!(
        item_id = %item.id,
        user_id = %user.id,
        quantity = request.quantity,
        available = item.available_quantity,
        "Inventory issued"
    );

    Ok(Json(StockChangeResponse {
        message: "Item issued successfully".to_string(),
        item,
    }))
}

/// Put previously issued units back.
///
/// POST /api/inventory/return
///
/// Requires a session and answers 403 unless `inventory.returns_enabled` is
/// set. Callers can only return what they still hold.
async fn return_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<ReturnItemRequest>,
) -> Result<Json<StockChangeResponse>, ApiError> {
    if !state.config.inventory.returns_enabled {
        return Err(InventoryError::ReturnsDisabled.into());
    }

    request.validate()?;

    let item = InventoryRepository::new(state.pool.clone())
        .return_stock(request.item_id, user.id, request.quantity)
        .await?;

    info!(
        item_id = %item.id,
        user_id = %user.id,
        quantity = request.quantity,
        "Inventory returned"
    );

    Ok(Json(StockChangeResponse {
        message: "Item returned successfully".to_string(),
        item,
    }))
}
