use std::collections::HashMap;
use std::sync::Mutex;

use crate::database::models::{NewPaymentWebhookState, PaymentWebhookState};
use crate::error::StoreError;

/// Number of records returned by the recency endpoints.
pub const RECENT_EVENTS_LIMIT: usize = 10;

/// Repository for payment webhook states.
///
/// Implementations must make `upsert` atomic per `id`: concurrent writers of
/// the same transaction either insert once or update the existing row, never
/// both insert. Calls are blocking and are driven from `spawn_blocking`.
pub trait PaymentStore: Send + Sync + 'static {
    /// Inserts `record`, or on an `id` conflict overwrites `status`,
    /// `updated_at`, `transaction_id`, `amount`, `currency` and the payment
    /// method of the existing row.
    fn upsert(&self, record: NewPaymentWebhookState) -> Result<(), StoreError>;

    /// Returns up to `limit` records, newest `created_at` first, ties broken
    /// by `id` descending.
    fn recent(&self, limit: usize) -> Result<Vec<PaymentWebhookState>, StoreError>;
}

/// Process-lifetime payment store, for deployments without a database.
#[derive(Debug, Default)]
pub struct MemoryPaymentStore {
    rows: Mutex<HashMap<String, PaymentWebhookState>>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Result<Option<PaymentWebhookState>, StoreError> {
        let rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(id).cloned())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl PaymentStore for MemoryPaymentStore {
    fn upsert(&self, record: NewPaymentWebhookState) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        match rows.get_mut(&record.id) {
            Some(existing) => existing.apply_update(&record),
            None => {
                rows.insert(record.id.clone(), record.into());
            }
        }
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<PaymentWebhookState>, StoreError> {
        let rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        let mut recent: Vec<PaymentWebhookState> = rows.values().cloned().collect();
        recent.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        recent.truncate(limit);
        Ok(recent)
    }
}
