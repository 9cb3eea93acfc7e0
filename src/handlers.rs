use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::database::models::PaymentWebhookState;
use crate::error::{ApiError, StoreError};
use crate::extract::WebhookPayload;
use crate::payload::PaymentNotification;
use crate::store::RECENT_EVENTS_LIMIT;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct EventsResponse<T> {
    pub events: Vec<T>,
}

/// POST payment webhook: upserts the payment state keyed by transaction id.
///
/// Always answers 200. Validation and store failures are reported in the
/// body as `{"error": ...}`.
#[tracing::instrument(skip_all)]
pub async fn payment_webhook_handler(
    State(state): State<AppState>,
    WebhookPayload(payload): WebhookPayload,
) -> Json<Value> {
    info!("Payment webhook received: {payload}");

    let notification = match PaymentNotification::from_payload(&payload) {
        Ok(notification) => notification,
        Err(e) => {
            error!("Rejected payment webhook: {e}");
            return Json(json!({ "error": e.to_string() }));
        }
    };

    let order_id = notification.order_id.clone();
    let record = notification.into_record(chrono::Utc::now().naive_utc());
    let store = state.payments.clone();
    let result = tokio::task::spawn_blocking(move || store.upsert(record))
        .await
        .map_err(StoreError::from)
        .and_then(|r| r);

    match result {
        Ok(()) => {
            info!("Successfully processed payment webhook for order {order_id}");
            Json(json!({ "status": "ok" }))
        }
        Err(e) => {
            error!("Error processing payment webhook: {e}");
            Json(json!({ "error": e.to_string() }))
        }
    }
}

/// GET the ten most recently created payment states, newest first.
#[tracing::instrument(skip_all)]
pub async fn payment_last_events_handler(
    State(state): State<AppState>,
) -> Result<Json<EventsResponse<PaymentWebhookState>>, ApiError> {
    let store = state.payments.clone();
    let events = tokio::task::spawn_blocking(move || store.recent(RECENT_EVENTS_LIMIT))
        .await
        .map_err(StoreError::from)??;
    Ok(Json(EventsResponse { events }))
}

/// POST eSIM webhook: appends the raw payload to the event log.
#[tracing::instrument(skip_all)]
pub async fn esim_webhook_handler(
    State(state): State<AppState>,
    WebhookPayload(payload): WebhookPayload,
) -> Json<Value> {
    info!("eSIM webhook received: {payload}");
    state.esim_events.append(payload).await;
    Json(json!({ "status": "ok" }))
}

/// GET the last ten eSIM payloads in arrival order.
#[tracing::instrument(skip_all)]
pub async fn esim_last_events_handler(
    State(state): State<AppState>,
) -> Json<EventsResponse<Value>> {
    let events = state.esim_events.last(RECENT_EVENTS_LIMIT).await;
    Json(EventsResponse { events })
}

/// GET /health for liveness probes.
#[tracing::instrument]
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
