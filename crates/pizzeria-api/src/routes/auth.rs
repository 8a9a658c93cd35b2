//! Authentication extractors and routes

use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    routing::{get, post},
};
use pizzeria_auth::{
    AuthError, authenticate, hash_password_blocking, require_staff, resolve_principal,
    resolve_refresh,
};
use pizzeria_db::{NewUser, User};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::AppState;

use super::extract::{FormBody, JsonBody};
use super::types::{
    LoginForm, LoginResponse, MessageResponse, RefreshRequest, SignupRequest, UserResponse,
};

// ==================== Auth Extractors ====================

/// Extractor for the authenticated user (required)
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let user = resolve_principal(&app_state.tokens, &app_state.db, auth_header).await?;

        debug!("Authenticated user: {} (staff: {})", user.username, user.is_staff);
        Ok(CurrentUser(user))
    }
}

/// Extractor for a staff user (required)
pub struct StaffUser(pub User);

impl<S> FromRequestParts<S> for StaffUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_staff(&user)?;
        Ok(StaffUser(user))
    }
}

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 25;
/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 80;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

/// Validate username format and length
fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    // Only allow alphanumeric characters, underscores, and hyphens
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate email shape and length
fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::BadRequest("Invalid email address".to_string())),
    }
}

/// Validate password length
fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password cannot be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Auth Routes ====================

/// GET /auth/
async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello World".to_string(),
    })
}

/// POST /auth/signup
async fn signup(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_username(&request.username)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    debug!("Signup attempt for user: {}", request.username);

    let password_hash = hash_password_blocking(request.password).await?;

    let user = state
        .db
        .insert_user(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
            is_staff: request.is_staff.unwrap_or(false),
            is_active: request.is_active.unwrap_or(true),
        })
        .await?;

    metrics::counter!("pizzeria_signups_total").increment(1);
    info!("Created user: {}", user.username);

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    FormBody(form): FormBody<LoginForm>,
) -> Result<Json<LoginResponse>, ApiError> {
    debug!("Login attempt for user: {}", form.username);

    // Oversized input gets the same answer as a wrong password
    if form.password.len() > MAX_PASSWORD_LENGTH {
        metrics::counter!("pizzeria_logins_total", "outcome" => "failure").increment(1);
        return Err(AuthError::InvalidCredentials.into());
    }

    let user = match authenticate(&state.db, &form.username, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                warn!("Failed login for user: {}", form.username);
                metrics::counter!("pizzeria_logins_total", "outcome" => "failure").increment(1);
            }
            return Err(e.into());
        }
    };

    let response = issue_tokens(&state, user)?;

    metrics::counter!("pizzeria_logins_total", "outcome" => "success").increment(1);
    info!("User {} logged in successfully", response.user.username);

    Ok(Json(response))
}

/// POST /auth/refresh
async fn refresh(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = resolve_refresh(&state.tokens, &state.db, &request.refresh_token).await?;

    debug!("Refreshing tokens for user: {}", user.username);

    Ok(Json(issue_tokens(&state, user)?))
}

/// GET /auth/user/me
async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

fn issue_tokens(state: &AppState, user: User) -> Result<LoginResponse, ApiError> {
    let pair = state.tokens.issue_pair(&user.username, user.id)?;

    Ok(LoginResponse {
        access_token: pair.access_token,
        token_type: "bearer",
        expires_in: pair.expires_in,
        refresh_token: pair.refresh_token,
        user: UserResponse::from(user),
    })
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/", get(hello))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/user/me", get(me))
}
