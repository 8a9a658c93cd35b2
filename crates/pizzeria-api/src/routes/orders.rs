//! Order management routes
//!
//! Customers act only on their own orders; an order owned by someone else is
//! reported exactly like a missing one. Staff routes see every order.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use pizzeria_db::NewOrder;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::{CurrentUser, StaffUser};
use super::extract::{JsonBody, PathParam};
use super::types::{MessageResponse, OrderRequest, OrderResponse, OrderStatusUpdate};

/// Validate order quantity
fn validate_quantity(quantity: i64) -> Result<(), ApiError> {
    if quantity < 1 {
        return Err(ApiError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn order_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Order: {}", id))
}

// ==================== Customer Routes ====================

/// GET /order/
async fn hello(_user: CurrentUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello World".to_string(),
    })
}

/// POST /order/order
async fn place_order(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<OrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    validate_quantity(request.quantity)?;

    let order = state
        .db
        .insert_order(NewOrder {
            quantity: request.quantity,
            order_status: request.order_status,
            pizza_size: request.pizza_size,
            user_id: user.id,
        })
        .await?;

    metrics::counter!("pizzeria_orders_placed_total").increment(1);
    info!("User {} placed order {}", user.username, order.id);

    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

/// GET /order/user/orders
async fn list_user_orders(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.db.list_orders_for_user(user.id).await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /order/user/order/{order_id}
async fn get_user_order(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    PathParam(order_id): PathParam<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .db
        .get_order_for_user(order_id, user.id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;

    Ok(Json(OrderResponse::from(order)))
}

/// PATCH /order/order/update/{order_id}
async fn update_order(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    PathParam(order_id): PathParam<i64>,
    JsonBody(request): JsonBody<OrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    validate_quantity(request.quantity)?;

    debug!("User {} updating order {}", user.username, order_id);

    let updated = state
        .db
        .update_order_details(order_id, user.id, request.quantity, request.pizza_size)
        .await?;
    if !updated {
        return Err(order_not_found(order_id));
    }

    let order = state
        .db
        .get_order_for_user(order_id, user.id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;

    info!("Updated order {}", order_id);
    Ok(Json(OrderResponse::from(order)))
}

/// DELETE /order/order/delete/{order_id}
async fn delete_order(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    PathParam(order_id): PathParam<i64>,
) -> Result<StatusCode, ApiError> {
    debug!("User {} deleting order {}", user.username, order_id);

    if state.db.delete_order_for_user(order_id, user.id).await? {
        info!("Deleted order {}", order_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(order_not_found(order_id))
    }
}

// ==================== Staff Routes ====================

/// GET /order/all/orders (Staff only)
async fn list_all_orders(
    _staff: StaffUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.db.list_orders().await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /order/order/{order_id} (Staff only)
async fn get_any_order(
    _staff: StaffUser,
    State(state): State<AppState>,
    PathParam(order_id): PathParam<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .db
        .get_order(order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;

    Ok(Json(OrderResponse::from(order)))
}

/// PATCH /order/order/status/{order_id} (Staff only)
async fn update_order_status(
    StaffUser(staff): StaffUser,
    State(state): State<AppState>,
    PathParam(order_id): PathParam<i64>,
    JsonBody(request): JsonBody<OrderStatusUpdate>,
) -> Result<Json<OrderResponse>, ApiError> {
    if !state
        .db
        .update_order_status(order_id, request.order_status)
        .await?
    {
        return Err(order_not_found(order_id));
    }

    let order = state
        .db
        .get_order(order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;

    info!(
        "Staff {} set order {} to {}",
        staff.username,
        order_id,
        order.order_status.as_str()
    );
    Ok(Json(OrderResponse::from(order)))
}

/// Create order routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/order/", get(hello))
        .route("/order/order", post(place_order))
        .route("/order/user/orders", get(list_user_orders))
        .route("/order/user/order/{order_id}", get(get_user_order))
        .route("/order/order/update/{order_id}", patch(update_order))
        .route("/order/order/delete/{order_id}", delete(delete_order))
        .route("/order/all/orders", get(list_all_orders))
        .route("/order/order/{order_id}", get(get_any_order))
        .route("/order/order/status/{order_id}", patch(update_order_status))
}
