//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod chatbot;
pub mod health;
pub mod inventory;
pub mod meetings;
pub mod posts;
pub mod projects;
