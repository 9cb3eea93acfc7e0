//! Postgres payment store tests.
//!
//! Need a disposable database in `DATABASE_URL`; run with
//! `cargo test -- --ignored`.

use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use globlink_webhooks::database::models::PaymentWebhookState;
use globlink_webhooks::database::{
    create_db_pool, ensure_schema, get_conn, schema, PgPaymentStore, PgPool,
};
use globlink_webhooks::PaymentStore;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn store() -> (PgPaymentStore, PgPool) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_db_pool(&url, 2).expect("failed to connect");
    ensure_schema(&pool).expect("failed to create schema");
    (PgPaymentStore::new(pool.clone()), pool)
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

fn fetch(pool: &PgPool, tx: &str) -> Vec<PaymentWebhookState> {
    let mut conn = get_conn(pool).expect("failed to get connection");
    schema::payment_webhook_states::table
        .filter(schema::payment_webhook_states::id.eq(tx))
        .select(PaymentWebhookState::as_select())
        .load(&mut conn)
        .expect("failed to load rows")
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[test]
#[ignore = "requires DATABASE_URL"]
fn upsert_preserves_creation_fields() {
    let (store, pool) = store();
    let tx = unique("tx");
    let created = now();

    store
        .upsert(PaymentWebhookState::new(
            "o1".to_string(),
            tx.clone(),
            Some("pending".to_string()),
            None,
            Some(dec!(9.99)),
            Some("USD".to_string()),
            created,
        ))
        .unwrap();
    store
        .upsert(PaymentWebhookState::new(
            "o2".to_string(),
            tx.clone(),
            Some("completed".to_string()),
            Some("card".to_string()),
            Some(dec!(10.50)),
            Some("EUR".to_string()),
            created + Duration::seconds(5),
        ))
        .unwrap();

    let rows = fetch(&pool, &tx);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.order_id, "o1");
    assert_eq!(row.status.as_deref(), Some("completed"));
    assert_eq!(row.payment_method_id.as_deref(), Some("card"));
    assert_eq!(row.amount, Some(dec!(10.50)));
    assert_eq!(row.currency.as_deref(), Some("EUR"));
    assert!(row.updated_at > row.created_at);
}

#[test]
#[ignore = "requires DATABASE_URL"]
fn recent_is_newest_first() {
    let (store, _) = store();
    // Far in the future so other rows in the table sort after these
    let base = now() + Duration::days(365 * 100);
    let ids: Vec<String> = (0..3).map(|_| unique("recent")).collect();
    for (i, tx) in ids.iter().enumerate() {
        store
            .upsert(PaymentWebhookState::new(
                "o".to_string(),
                tx.clone(),
                None,
                None,
                None,
                None,
                base + Duration::seconds(i as i64),
            ))
            .unwrap();
    }

    let recent = store.recent(3).unwrap();
    let got: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
    let expected: Vec<&str> = ids.iter().rev().map(String::as_str).collect();
    assert_eq!(got, expected);
}
