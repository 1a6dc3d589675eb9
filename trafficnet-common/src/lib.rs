//! # TrafficNet Common Library
//!
//! Shared code for the TrafficNet labeling services including:
//! - Sample record models and the sample store (sqlx)
//! - Access gate primitives (Basic auth, cookie encoding)
//! - Configuration loading (TOML, workplace label schemas)
//! - Common error type

pub mod api;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
