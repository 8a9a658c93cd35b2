//! Application state

use pizzeria_auth::TokenCodec;
use pizzeria_db::Database;
use std::sync::Arc;

/// Prometheus render handle served at `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(db: Database, tokens: Arc<TokenCodec>) -> Self {
        Self { db, tokens }
    }
}
