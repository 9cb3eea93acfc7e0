use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stored payment webhook state, one row per transaction.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::payment_webhook_states)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentWebhookState {
    pub id: String,
    pub order_id: String,
    pub status: Option<String>,
    pub transaction_id: String,
    #[diesel(column_name = pm_id)]
    #[serde(rename = "pm_id")]
    pub payment_method_id: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub user_id: Option<String>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::payment_webhook_states)]
pub struct NewPaymentWebhookState {
    pub id: String,
    pub order_id: String,
    pub status: Option<String>,
    pub transaction_id: String,
    #[diesel(column_name = pm_id)]
    pub payment_method_id: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub user_id: Option<String>,
}

impl PaymentWebhookState {
    /// Builds the record keyed by its transaction id, stamped with `now`
    /// for both timestamps.
    pub fn new(
        order_id: String,
        transaction_id: String,
        status: Option<String>,
        payment_method_id: Option<String>,
        amount: Option<Decimal>,
        currency: Option<String>,
        now: NaiveDateTime,
    ) -> NewPaymentWebhookState {
        NewPaymentWebhookState {
            id: transaction_id.clone(),
            order_id,
            status,
            transaction_id,
            payment_method_id,
            amount,
            currency,
            created_at: now,
            updated_at: now,
            user_id: None,
        }
    }

    /// Applies the fields an upsert is allowed to overwrite. `id`,
    /// `order_id`, `created_at` and `user_id` keep their first-write values.
    pub fn apply_update(&mut self, update: &NewPaymentWebhookState) {
        self.status = update.status.clone();
        self.updated_at = update.updated_at;
        self.transaction_id = update.transaction_id.clone();
        self.amount = update.amount;
        self.currency = update.currency.clone();
        self.payment_method_id = update.payment_method_id.clone();
    }
}

impl From<NewPaymentWebhookState> for PaymentWebhookState {
    fn from(new: NewPaymentWebhookState) -> Self {
        Self {
            id: new.id,
            order_id: new.order_id,
            status: new.status,
            transaction_id: new.transaction_id,
            payment_method_id: new.payment_method_id,
            amount: new.amount,
            currency: new.currency,
            created_at: new.created_at,
            updated_at: new.updated_at,
            user_id: new.user_id,
        }
    }
}
