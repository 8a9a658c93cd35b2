//! Username/password authentication

use pizzeria_db::{Database, User};
use tracing::debug;

use crate::error::AuthError;
use crate::password::verify_password;

/// Valid argon2id hash of a random value, verified when the user is unknown
/// so that both paths spend the same time hashing
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

/// Validate a username/password pair
///
/// Unknown user, wrong password and inactive account all fail with the same
/// `InvalidCredentials` error.
pub async fn authenticate(db: &Database, username: &str, password: &str) -> Result<User, AuthError> {
    let user = db.get_user_by_username(username).await?;

    let hash = user
        .as_ref()
        .map(|u| u.password_hash.clone())
        .unwrap_or_else(|| DUMMY_HASH.to_string());
    let password = password.to_string();
    let password_valid =
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::PasswordHash(format!("Task join error: {}", e)))?;

    match (user, password_valid) {
        (Some(user), true) if user.is_active => Ok(user),
        _ => {
            debug!("Authentication failed for user: {}", username);
            Err(AuthError::InvalidCredentials)
        }
    }
}
