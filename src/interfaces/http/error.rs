use crate::error::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum CronError {
    #[error("{0} env var not set")]
    MissingConfig(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Billing pass failed: {0}")]
    Job(#[from] Error),

    #[error("Billing pass aborted: {0}")]
    Aborted(String),

    #[error("Billing pass exceeded {0:?}")]
    Timeout(Duration),
}

impl IntoResponse for CronError {
    fn into_response(self) -> Response {
        match self {
            CronError::MissingConfig(name) => {
                tracing::error!("{name} env var not set");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
            CronError::Unauthorized => {
                tracing::warn!("Rejected cron request with bad authorization");
                (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            CronError::Job(ref e) => {
                tracing::error!("Billing pass failed: {:?}", e);
                let body = Json(json!({
                    "error": "Billing pass failed",
                    "details": self.to_string(),
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            CronError::Aborted(ref e) => {
                tracing::error!("Billing pass aborted: {}", e);
                let body = Json(json!({
                    "error": "Billing pass aborted",
                    "details": self.to_string(),
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            CronError::Timeout(limit) => {
                tracing::warn!(?limit, "Billing pass still running after the time limit");
                (StatusCode::GATEWAY_TIMEOUT, self.to_string()).into_response()
            }
        }
    }
}
