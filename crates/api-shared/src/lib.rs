//! # API Shared
//!
//! Shared definitions for the deckstream HTTP API.
//!
//! Contains:
//! - Request/response bodies with OpenAPI schemas (`messages` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and by the CLI's remote mode.

pub mod health;
pub mod messages;

pub use health::HealthService;
pub use messages::*;
