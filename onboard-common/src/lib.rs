//! # Onboard Common Library
//!
//! Shared code for the onboarding checkpoint services including:
//! - Error types
//! - Bootstrap configuration and root folder resolution
//! - Database initialization
//! - Timestamp and duration formatting utilities

pub mod config;
pub mod db;
pub mod error;
pub mod human_time;
pub mod time;

pub use error::{Error, Result};
