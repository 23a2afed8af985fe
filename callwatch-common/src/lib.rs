//! # Callwatch Common Library
//!
//! Shared code for the callwatch client crates including:
//! - Socket event types (CampaignEvent enum)
//! - Call and campaign domain types
//! - REST snapshot shapes
//! - Error type
//! - Configuration resolution

pub mod config;
pub mod error;
pub mod events;
pub mod records;
pub mod snapshot;

pub use error::{Error, Result};
