//! Shared utilities for the CICR Connect backend.
//!
//! - Argon2id password hashing
//! - HS256 session tokens
//! - SHA-256 token hashing and random code generation
//! - Field validators reused by request DTOs
//! - Lenient deserializers for form-style bodies

pub mod crypto;
pub mod jwt;
pub mod lenient;
pub mod password;
pub mod validation;
