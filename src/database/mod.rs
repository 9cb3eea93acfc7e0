use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::upsert::excluded;
use tracing::{error, info};

use crate::error::StoreError;
use crate::store::PaymentStore;
use models::{NewPaymentWebhookState, PaymentWebhookState};

pub mod models;
pub mod schema;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

const CREATE_PAYMENT_WEBHOOK_STATES: &str = "\
CREATE TABLE IF NOT EXISTS payment_webhook_states (
    id TEXT PRIMARY KEY,
    order_id TEXT NOT NULL,
    status TEXT,
    transaction_id TEXT NOT NULL,
    pm_id TEXT,
    amount NUMERIC(10, 2),
    currency TEXT,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL,
    user_id TEXT
)";

const CREATE_CREATED_AT_INDEX: &str = "\
CREATE INDEX IF NOT EXISTS payment_webhook_states_created_at_idx
    ON payment_webhook_states (created_at DESC)";

pub fn create_db_pool(database_url: &str, max_size: u32) -> Result<PgPool, StoreError> {
    info!("Connecting to database");

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| {
            error!("Failed to create database connection pool: {}", e);
            e
        })?;

    // Verify connection works
    let _conn = get_conn(&pool)?;

    info!("Successfully connected to database");
    Ok(pool)
}

pub fn get_conn(pool: &PgPool) -> Result<PgPooledConnection, StoreError> {
    pool.get().map_err(|e| {
        error!("Failed to get database connection from pool: {}", e);
        StoreError::from(e)
    })
}

/// Creates `payment_webhook_states` and its recency index if absent.
pub fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    let mut conn = get_conn(pool)?;
    diesel::sql_query(CREATE_PAYMENT_WEBHOOK_STATES).execute(&mut conn)?;
    diesel::sql_query(CREATE_CREATED_AT_INDEX).execute(&mut conn)?;
    info!("Database schema ready");
    Ok(())
}

/// Postgres-backed payment store. Conflict resolution is delegated to
/// `INSERT ... ON CONFLICT (id) DO UPDATE`, which is atomic per row.
#[derive(Clone)]
pub struct PgPaymentStore {
    pool: PgPool,
}

impl PgPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PaymentStore for PgPaymentStore {
    fn upsert(&self, record: NewPaymentWebhookState) -> Result<(), StoreError> {
        use schema::payment_webhook_states::dsl::*;

        let mut conn = get_conn(&self.pool)?;
        diesel::insert_into(payment_webhook_states)
            .values(&record)
            .on_conflict(id)
            .do_update()
            .set((
                status.eq(excluded(status)),
                updated_at.eq(excluded(updated_at)),
                transaction_id.eq(excluded(transaction_id)),
                amount.eq(excluded(amount)),
                currency.eq(excluded(currency)),
                pm_id.eq(excluded(pm_id)),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<PaymentWebhookState>, StoreError> {
        use schema::payment_webhook_states::dsl::*;

        let mut conn = get_conn(&self.pool)?;
        let rows = payment_webhook_states
            .order((created_at.desc(), id.desc()))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(PaymentWebhookState::as_select())
            .load(&mut conn)?;
        Ok(rows)
    }
}
