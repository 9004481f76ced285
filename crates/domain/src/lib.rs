//! Domain layer for the CICR Connect backend.
//!
//! This crate contains:
//! - Domain models (User, InviteCode, Project, Meeting, InventoryItem, Post)
//! - The closed `Role` enum and the single authorization decision
//! - Request/response DTOs with validation rules
//! - Pure business rules (invite redemption, stock arithmetic, like toggling,
//!   meeting time window, summary prompt composition)

pub mod models;
