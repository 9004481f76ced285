//! Lab inventory and the issuance ledger.
//!
//! Stock arithmetic lives here so repositories and handlers agree on the
//! invariant `0 <= available_quantity <= total_quantity`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::user::UserRef;

/// Errors for inventory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Item not found")]
    ItemNotFound,

    #[error("Insufficient stock")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Cannot return more than you hold ({outstanding} outstanding)")]
    ReturnExceedsOutstanding { requested: i32, outstanding: i32 },

    #[error("Item returns are not enabled")]
    ReturnsDisabled,

    #[error("Total quantity cannot drop below the {in_use} units currently issued")]
    StockInUse { in_use: i32 },
}

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuanceKind {
    Issue,
    Return,
}

impl IssuanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssuanceKind::Issue => "issue",
            IssuanceKind::Return => "return",
        }
    }
}

impl fmt::Display for IssuanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ledger line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuance {
    pub id: Uuid,
    pub user: UserRef,
    pub quantity: i32,
    pub project: Option<String>,
    pub kind: IssuanceKind,
    pub issue_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub item_name: String,
    pub category: String,
    pub total_quantity: i32,
    pub available_quantity: i32,
    pub location: Option<String>,
    pub issued_to: Vec<Issuance>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validates an issue of `quantity` units and returns the remaining stock.
pub fn check_issue(available: i32, quantity: i32) -> Result<i32, InventoryError> {
    if quantity < 1 {
        return Err(InventoryError::InvalidQuantity);
    }
    if quantity > available {
        return Err(InventoryError::InsufficientStock {
            requested: quantity,
            available,
        });
    }
    Ok(available - quantity)
}

/// Units a user still holds: everything issued minus everything returned.
pub fn outstanding_for(ledger: &[Issuance], user_id: Uuid) -> i32 {
    ledger
        .iter()
        .filter(|entry| entry.user.id == user_id)
        .map(|entry| match entry.kind {
            IssuanceKind::Issue => entry.quantity,
            IssuanceKind::Return => -entry.quantity,
        })
        .sum()
}

/// Validates a return and returns the new available stock.
///
/// Available stock never exceeds the total even if the ledger is out of step.
pub fn check_return(
    available: i32,
    total: i32,
    outstanding: i32,
    quantity: i32,
) -> Result<i32, InventoryError> {
    if quantity < 1 {
        return Err(InventoryError::InvalidQuantity);
    }
    if quantity > outstanding {
        return Err(InventoryError::ReturnExceedsOutstanding {
            requested: quantity,
            outstanding,
        });
    }
    Ok((available + quantity).min(total))
}

/// Applies a new total and returns the matching available stock.
pub fn resize_stock(total: i32, available: i32, new_total: i32) -> Result<i32, InventoryError> {
    let in_use = total - available;
    if new_total < in_use {
        return Err(InventoryError::StockInUse { in_use });
    }
    Ok(new_total - in_use)
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[validate(
        length(max = 200, message = "Item name must be at most 200 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub item_name: String,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub category: String,

    #[validate(range(min = 0, message = "Total quantity must not be negative"))]
    pub total_quantity: i32,

    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub item_name: Option<String>,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub category: Option<String>,

    #[validate(range(min = 0, message = "Total quantity must not be negative"))]
    pub total_quantity: Option<i32>,

    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueItemRequest {
    pub item_id: Uuid,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    #[validate(length(max = 200, message = "Project label must be at most 200 characters"))]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItemRequest {
    pub item_id: Uuid,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChangeResponse {
    pub message: String,
    pub item: InventoryItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCapabilities {
    pub returns_enabled: bool,
}
