use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::server::AppState;
use crate::webhook::{WebhookRecord, WebhookSource};

/// Passport webhook endpoint
pub async fn passport(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    handle(&state, WebhookSource::Passport, &headers, &body)
}

/// Apps webhook endpoint
pub async fn apps(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    handle(&state, WebhookSource::Apps, &headers, &body)
}

/// Combined endpoint: the source is read from the body itself.
///
/// An unknown or missing source is acknowledged with a 200 so the provider
/// does not retry deliveries we will never understand.
pub async fn general(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let source = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("source")
                .and_then(serde_json::Value::as_str)
                .and_then(WebhookSource::parse)
        });

    match source {
        Some(source) => handle(&state, source, &headers, &body),
        None => {
            tracing::info!("webhook with unknown source ignored");
            (StatusCode::OK, Json(json!({"status": "ignored"}))).into_response()
        }
    }
}

fn handle(state: &AppState, source: WebhookSource, headers: &HeaderMap, body: &str) -> Response {
    let signature = headers
        .get(state.receiver.signature_header())
        .and_then(|v| v.to_str().ok());

    let record = state.receiver.process(source, body, signature);
    persist(state, &record);

    let status = StatusCode::from_u16(record.outcome.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut payload = json!({"status": record.outcome.as_str()});
    if let Some(error) = &record.error {
        payload["error"] = json!(error);
    }
    (status, Json(payload)).into_response()
}

/// Every delivery gets a log row, rejected ones included. A logging failure
/// must not change the status the provider sees.
fn persist(state: &AppState, record: &WebhookRecord) {
    if let Err(e) = state.store.record_webhook(record) {
        tracing::error!(error = %e, "failed to record webhook delivery");
    }
}
