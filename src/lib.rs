//! Webhook receiver for payment state changes and eSIM provisioning events.
//!
//! Payment webhooks are upserted by transaction id into a [`PaymentStore`];
//! eSIM webhooks are appended to an in-process [`EsimEventLog`]. Both have a
//! recency endpoint returning the last ten entries.

use std::sync::Arc;

pub mod config;
pub mod database;
pub mod error;
pub mod esim;
pub mod extract;
pub mod handlers;
pub mod payload;
pub mod server;
pub mod store;

pub use config::{Config, PaymentStoreKind, RouteConfig};
pub use esim::EsimEventLog;
pub use server::{create_router, start_server};
pub use store::{MemoryPaymentStore, PaymentStore};

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<dyn PaymentStore>,
    pub esim_events: Arc<EsimEventLog>,
}

impl AppState {
    pub fn new(payments: Arc<dyn PaymentStore>, esim_events: Arc<EsimEventLog>) -> Self {
        Self {
            payments,
            esim_events,
        }
    }
}
