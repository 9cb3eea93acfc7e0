#![allow(dead_code)]

use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use globlink_webhooks::database::models::{NewPaymentWebhookState, PaymentWebhookState};
use globlink_webhooks::error::StoreError;
use globlink_webhooks::{
    create_router, AppState, EsimEventLog, MemoryPaymentStore, PaymentStore, RouteConfig,
};
use hyper::StatusCode;
use serde_json::Value;
use tower::ServiceExt;

/// Router plus handles on the stores behind it.
pub struct TestApp {
    pub router: Router,
    pub payments: Arc<MemoryPaymentStore>,
    pub esim_events: Arc<EsimEventLog>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_routes(&RouteConfig::default())
    }

    pub fn with_routes(routes: &RouteConfig) -> Self {
        let payments = Arc::new(MemoryPaymentStore::new());
        let esim_events = Arc::new(EsimEventLog::new());
        let state = AppState::new(payments.clone(), esim_events.clone());
        Self {
            router: create_router(state, routes),
            payments,
            esim_events,
        }
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.post_raw(uri, body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: impl Into<String>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.into()))
            .unwrap();
        send(&self.router, request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(&self.router, request).await
    }
}

/// Sends one request and decodes the body as JSON, or as a JSON string when
/// it is not JSON.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("failed to make request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

/// A store whose every call fails, for exercising error paths.
pub struct UnavailableStore;

impl PaymentStore for UnavailableStore {
    fn upsert(&self, _record: NewPaymentWebhookState) -> Result<(), StoreError> {
        Err(StoreError::Poisoned)
    }

    fn recent(&self, _limit: usize) -> Result<Vec<PaymentWebhookState>, StoreError> {
        Err(StoreError::Poisoned)
    }
}

pub fn unavailable_router() -> Router {
    let state = AppState::new(Arc::new(UnavailableStore), Arc::new(EsimEventLog::new()));
    create_router(state, &RouteConfig::default())
}
