//! Pizzeria REST API
//!
//! This crate provides the Axum-based HTTP API for the pizza-delivery
//! service: signup, login, token refresh, the current-user endpoint, and
//! order management gated on the authenticated user.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
