use super::AppState;
use super::error::CronError;
use crate::application::billing::{BillingJob, BillingSettings};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
};
use chrono::Utc;
use serde_json::{Value, json};

/// Checks configuration and the caller's bearer token.
///
/// Returns the receive wallet to bill into. Nothing here touches a store.
pub fn authorize(state: &AppState, headers: &HeaderMap) -> Result<String, CronError> {
    let secret = state
        .cron_secret
        .as_deref()
        .ok_or(CronError::MissingConfig("CRON_SECRET"))?;
    let receive_wallet = state
        .receive_wallet
        .clone()
        .ok_or(CronError::MissingConfig("EAP_RECEIVE_WALLET_ADDRESS"))?;

    let expected = format!("Bearer {secret}");
    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if provided != Some(expected.as_str()) {
        return Err(CronError::Unauthorized);
    }

    Ok(receive_wallet)
}

/// `GET /api/cron/subscription`: run one billing pass.
///
/// Answers `{"success": true}` once the pass completes, whatever the
/// individual payments did. The pass runs on its own task: when it outlives
/// `max_duration` the caller gets a 504 and the pass carries on, so no
/// payment is left half-recorded by the timeout.
pub async fn run_subscription_cron(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, CronError> {
    let receive_wallet = authorize(&state, &headers)?;

    let job = BillingJob::new(
        state.ports.clone(),
        BillingSettings {
            receive_wallet,
            price: state.price,
        },
    );
    let now = Utc::now();
    let pass = tokio::spawn(async move { job.run(now).await });

    match tokio::time::timeout(state.max_duration, pass).await {
        Ok(Ok(Ok(_report))) => Ok(Json(json!({ "success": true }))),
        Ok(Ok(Err(err))) => Err(CronError::Job(err)),
        Ok(Err(err)) => Err(CronError::Aborted(err.to_string())),
        Err(_) => Err(CronError::Timeout(state.max_duration)),
    }
}
