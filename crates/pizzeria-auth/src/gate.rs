//! Session gate: bearer token to current user
//!
//! Tokens are never trusted on their own. Every request re-resolves the
//! token subject against the user table, so a user who was deleted, renamed
//! or deactivated is rejected even while their signed token is still valid.

use pizzeria_db::{Database, User};
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::{Claims, TokenCodec, TokenKind};

/// Extract bearer token from authorization header
///
/// The scheme name is matched case-insensitively.
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Resolve the user behind an `Authorization` header value
pub async fn resolve_principal(
    codec: &TokenCodec,
    db: &Database,
    auth_header: Option<&str>,
) -> Result<User, AuthError> {
    let header = auth_header.ok_or(AuthError::MissingAuthHeader)?;
    let token = extract_bearer_token(header)?;
    let claims = codec.decode_kind(token, TokenKind::Access)?;

    if claims.sub.is_empty() {
        debug!("Token rejected: empty subject");
        return Err(AuthError::InvalidToken);
    }

    let user = db
        .get_user_by_username(&claims.sub)
        .await?
        .ok_or_else(|| {
            debug!("Token rejected: unknown subject {}", claims.sub);
            AuthError::InvalidToken
        })?;

    check_live(&claims, user)
}

/// Resolve the user behind a refresh token
pub async fn resolve_refresh(
    codec: &TokenCodec,
    db: &Database,
    refresh_token: &str,
) -> Result<User, AuthError> {
    let claims = codec.decode_kind(refresh_token, TokenKind::Refresh)?;
    let user_id = claims.id.ok_or(AuthError::InvalidToken)?;

    let user = db
        .get_user_by_id(user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    check_live(&claims, user)
}

/// The resolved user must still match the token and be active
fn check_live(claims: &Claims, user: User) -> Result<User, AuthError> {
    if user.username != claims.sub || claims.id.is_some_and(|id| id != user.id) {
        debug!("Token rejected: identity mismatch for {}", claims.sub);
        return Err(AuthError::InvalidToken);
    }
    if !user.is_active {
        debug!("Token rejected: user {} is inactive", user.username);
        return Err(AuthError::InvalidToken);
    }
    Ok(user)
}

/// Require the principal to be a staff member
pub fn require_staff(principal: &User) -> Result<(), AuthError> {
    if !principal.is_staff {
        debug!("Staff check failed for {}", principal.username);
        return Err(AuthError::InsufficientPermissions);
    }
    Ok(())
}
