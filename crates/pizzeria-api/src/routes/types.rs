//! Request/Response DTOs

use pizzeria_db::{Order, OrderStatus, PizzaSize, User};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Signup request
#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_staff: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Login form (`application/x-www-form-urlencoded`)
///
/// OAuth2 password-flow fields such as `grant_type` and `scope` are accepted
/// and ignored.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Login and refresh response
#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub refresh_token: String,
    pub user: UserResponse,
}

/// User response (without password)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_staff: user.is_staff,
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Plain message body
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ==================== Order Types ====================

/// Place or update order request
#[derive(Deserialize)]
pub struct OrderRequest {
    pub quantity: i64,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default)]
    pub pizza_size: PizzaSize,
}

/// Order status update request
#[derive(Deserialize)]
pub struct OrderStatusUpdate {
    #[serde(default)]
    pub order_status: OrderStatus,
}

/// Order response
#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub quantity: i64,
    pub order_status: OrderStatus,
    pub pizza_size: PizzaSize,
    pub user_id: i64,
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            quantity: order.quantity,
            order_status: order.order_status,
            pizza_size: order.pizza_size,
            user_id: order.user_id,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}
