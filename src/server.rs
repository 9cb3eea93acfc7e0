//! Router assembly and HTTP serving.
//!
//! One router serves every deployment layout: the prefixed routes
//! (`/api/webhooks/...` by default) and, when enabled, the legacy
//! single-purpose paths. Requests pass through a request-id middleware and
//! `tower-http` tracing before reaching the handlers.

use std::net::SocketAddr;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Span};
use uuid::Uuid;

use crate::config::RouteConfig;
use crate::handlers::{
    esim_last_events_handler, esim_webhook_handler, health_handler, payment_last_events_handler,
    payment_webhook_handler,
};
use crate::AppState;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Id assigned to each request, echoed in `X-Request-Id` and recorded on
/// the request span.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub fn create_router(state: AppState, routes: &RouteConfig) -> Router {
    let api_routes = Router::new()
        .route("/esim", post(esim_webhook_handler))
        .route("/esim/last-events", get(esim_last_events_handler))
        .route("/payment", post(payment_webhook_handler))
        .route("/payment/last-events", get(payment_last_events_handler));

    let mut app = Router::new().route("/health", get(health_handler));

    app = if routes.api_prefix.is_empty() {
        app.merge(api_routes)
    } else {
        app.nest(&routes.api_prefix, api_routes)
    };

    if routes.legacy_routes {
        let legacy_routes = Router::new()
            .route("/globlinkesimwebhook", post(esim_webhook_handler))
            .route("/last-events", get(esim_last_events_handler))
            .route("/payssiongloblinkesimwebhhok", post(payment_webhook_handler));
        app = app.merge(legacy_routes);
    }

    // Outermost layer runs first, so the id exists before the span is made
    app.layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(middleware::from_fn(assign_request_id))
        .with_state(state)
}

async fn assign_request_id(mut req: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&id).ok();
    req.extensions_mut().insert(RequestId(id));

    let mut response = next.run(req).await;
    if let Some(header) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
    response
}

fn request_span(req: &Request) -> Span {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.as_str())
        .unwrap_or_default();
    tracing::info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        request_id = %request_id,
    )
}

/// Serves `app` on `addr` until SIGINT or SIGTERM, then drains in-flight
/// requests.
pub async fn start_server(app: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Webhook server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Cannot listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut sigterm) = signal::unix::signal(signal::unix::SignalKind::terminate()) else {
            error!("Cannot listen for SIGTERM");
            return std::future::pending::<()>().await;
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("Interrupted, draining in-flight requests"),
        () = terminate => info!("Terminated, draining in-flight requests"),
    }
}
