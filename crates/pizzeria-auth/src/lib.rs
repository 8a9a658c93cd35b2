//! Pizzeria Authentication and Authorization
//!
//! This crate provides password hashing, JWT access/refresh tokens,
//! credential checks, and the bearer-token session gate that resolves
//! the current user for protected endpoints.

pub mod authenticator;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod password;

pub use authenticator::authenticate;
pub use error::AuthError;
pub use gate::{extract_bearer_token, require_staff, resolve_principal, resolve_refresh};
pub use jwt::{Claims, TokenCodec, TokenKind, TokenPair, TokenSettings, parse_algorithms};
pub use password::{hash_password, hash_password_blocking, verify_password};
