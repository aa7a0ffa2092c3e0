//! HTTP surface: the cron trigger route and a health probe.

pub mod cron;
pub mod error;

use crate::config::Config;
use crate::domain::money::Amount;
use crate::domain::ports::BillingPorts;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub const CRON_ROUTE: &str = "/api/cron/subscription";
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(300);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ports: BillingPorts,
    pub cron_secret: Option<String>,
    pub receive_wallet: Option<String>,
    pub price: Amount,
    pub max_duration: Duration,
}

impl AppState {
    pub fn new(config: &Config, ports: BillingPorts) -> Self {
        Self {
            ports,
            cron_secret: config.cron_secret.clone(),
            receive_wallet: config.receive_wallet.clone(),
            price: config.subscription_price,
            max_duration: DEFAULT_MAX_DURATION,
        }
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(CRON_ROUTE, get(cron::run_subscription_cron))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
