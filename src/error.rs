use axum::{
    response::{IntoResponse, Response},
    Json,
};
use hyper::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Failures of the payment store, on either the write or the read path.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("database error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("payment store lock poisoned")]
    Poisoned,

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Reasons a payment webhook body cannot be turned into a record.
///
/// The display strings are part of the wire contract: they are returned
/// verbatim as `{"error": ...}`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("order_id missing")]
    MissingOrderId,

    #[error("transaction_id missing")]
    MissingTransactionId,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Error type for the recency query handlers.
///
/// Unlike the ingestion path, read failures surface as an HTTP failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Failed to query recent events: {self}");
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
