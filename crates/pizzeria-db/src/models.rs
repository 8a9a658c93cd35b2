//! Database models

use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidOrderStatus(String),
    InvalidPizzaSize(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidOrderStatus(s) => write!(f, "Invalid order status: {}", s),
            ParseError::InvalidPizzaSize(s) => write!(f, "Invalid pizza size: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_active: bool,
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    #[serde(rename = "In_transit")]
    InTransit,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::InTransit => "In_transit",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "In_transit" => Ok(OrderStatus::InTransit),
            "Delivered" => Ok(OrderStatus::Delivered),
            _ => Err(ParseError::InvalidOrderStatus(s.to_string())),
        }
    }
}

/// Pizza size
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PizzaSize {
    #[default]
    Small,
    Medium,
    Large,
    #[serde(rename = "Extra_large")]
    ExtraLarge,
}

impl PizzaSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PizzaSize::Small => "Small",
            PizzaSize::Medium => "Medium",
            PizzaSize::Large => "Large",
            PizzaSize::ExtraLarge => "Extra_large",
        }
    }
}

impl FromStr for PizzaSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Small" => Ok(PizzaSize::Small),
            "Medium" => Ok(PizzaSize::Medium),
            "Large" => Ok(PizzaSize::Large),
            "Extra_large" => Ok(PizzaSize::ExtraLarge),
            _ => Err(ParseError::InvalidPizzaSize(s.to_string())),
        }
    }
}

/// Order model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub quantity: i64,
    pub order_status: OrderStatus,
    pub pizza_size: PizzaSize,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// New order (for insertion)
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub quantity: i64,
    pub order_status: OrderStatus,
    pub pizza_size: PizzaSize,
    pub user_id: i64,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            is_staff: row.try_get("is_staff")?,
            is_active: row.try_get("is_active")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Order {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let status_str: String = row.try_get("order_status")?;
        let size_str: String = row.try_get("pizza_size")?;
        Ok(Order {
            id: row.try_get("id")?,
            quantity: row.try_get("quantity")?,
            order_status: OrderStatus::from_str(&status_str).map_err(|e| {
                sqlx::Error::ColumnDecode {
                    index: "order_status".to_string(),
                    source: Box::new(e),
                }
            })?,
            pizza_size: PizzaSize::from_str(&size_str).map_err(|e| sqlx::Error::ColumnDecode {
                index: "pizza_size".to_string(),
                source: Box::new(e),
            })?,
            user_id: row.try_get("user_id")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}
