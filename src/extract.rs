use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use hyper::StatusCode;
use serde_json::Value;
use tracing::{error, trace};

/// Extractor for webhook bodies.
///
/// Parses the body as JSON whatever the `Content-Type` header says, since
/// webhook senders do not reliably set it. Anything that is not valid JSON
/// is rejected with 400 before the handler runs.
pub struct WebhookPayload(pub Value);

impl<S> FromRequest<S> for WebhookPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            error!("Encountered error {e:?} when reading webhook body");
            e.into_response()
        })?;

        trace!("Payload: {}", String::from_utf8_lossy(&body));

        let payload = serde_json::from_slice(&body).map_err(|e| {
            error!("Webhook body is not valid JSON: {e}");
            (StatusCode::BAD_REQUEST, format!("Invalid JSON body: {e}")).into_response()
        })?;
        Ok(Self(payload))
    }
}
