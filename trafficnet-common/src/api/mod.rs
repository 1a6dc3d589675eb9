//! Shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY pure functions and shared types. No HTTP
//! framework dependencies; each service wraps these with its own
//! middleware (Axum, etc.).

pub mod auth;

pub use auth::{parse_basic_auth, GateCredentials, GateError, Identity, AUTH_COOKIE_NAME};
