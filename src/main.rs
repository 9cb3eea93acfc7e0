use std::sync::Arc;

use globlink_webhooks::database::{create_db_pool, ensure_schema, PgPaymentStore};
use globlink_webhooks::{
    create_router, start_server, AppState, Config, EsimEventLog, MemoryPaymentStore,
    PaymentStore, PaymentStoreKind,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_writer(std::io::stdout);
    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return Err(e.into());
        }
    };
    info!("Starting webhook server");

    let payments: Arc<dyn PaymentStore> = match config.payment_store {
        PaymentStoreKind::Postgres => {
            let url = config.database_url.clone().unwrap_or_default();
            let pool_size = config.database_pool_size;
            let auto_create_schema = config.auto_create_schema;
            // r2d2 connects synchronously
            let pool = tokio::task::spawn_blocking(move || {
                let pool = create_db_pool(&url, pool_size)?;
                if auto_create_schema {
                    ensure_schema(&pool)?;
                }
                Ok::<_, globlink_webhooks::error::StoreError>(pool)
            })
            .await?
            .map_err(|e| {
                error!("Failed to initialise database: {e}");
                e
            })?;
            Arc::new(PgPaymentStore::new(pool))
        }
        PaymentStoreKind::Memory => {
            warn!("Payment webhooks are kept in memory and lost on restart");
            Arc::new(MemoryPaymentStore::new())
        }
    };

    let esim_events = match config.esim_buffer_capacity {
        Some(capacity) => EsimEventLog::with_capacity(capacity),
        None => EsimEventLog::new(),
    };

    let state = AppState::new(payments, Arc::new(esim_events));
    let app = create_router(state, &config.routes);

    if let Err(e) = start_server(app, config.listen_addr()).await {
        error!("Webhook server error: {e}");
        return Err(e.into());
    }

    info!("Shutdown complete");
    Ok(())
}
