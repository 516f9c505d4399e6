//! Prompt Teams API Library
//!
//! Team and membership management for the prompt workspace: domain logic,
//! the Team Store adapters and the HTTP layer.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
