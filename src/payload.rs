//! Normalization of raw payment webhook bodies.
//!
//! The identifiers must be non-empty JSON strings. Other string fields also
//! accept numbers and booleans, and `amount` may arrive as a number or a
//! numeric string.

use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::database::models::{NewPaymentWebhookState, PaymentWebhookState};
use crate::error::PayloadError;

/// 99999999.99, the largest magnitude a NUMERIC(10, 2) column holds.
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// The fields of a payment webhook this service records.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentNotification {
    pub order_id: String,
    pub transaction_id: String,
    pub state: Option<String>,
    pub pm_id: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
}

impl PaymentNotification {
    /// `order_id` is checked before `transaction_id`, so a body missing both
    /// reports the missing order id.
    pub fn from_payload(payload: &Value) -> Result<Self, PayloadError> {
        let order_id = id_field(payload, "order_id").ok_or(PayloadError::MissingOrderId)?;
        let transaction_id =
            id_field(payload, "transaction_id").ok_or(PayloadError::MissingTransactionId)?;

        Ok(Self {
            order_id,
            transaction_id,
            state: string_field(payload, "state"),
            pm_id: string_field(payload, "pm_id"),
            amount: amount_field(payload)?,
            currency: string_field(payload, "currency"),
        })
    }

    pub fn into_record(self, now: NaiveDateTime) -> NewPaymentWebhookState {
        PaymentWebhookState::new(
            self.order_id,
            self.transaction_id,
            self.state,
            self.pm_id,
            self.amount,
            self.currency,
            now,
        )
    }
}

/// A non-empty JSON string; `0`, `false` and `""` count as missing.
fn id_field(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn amount_field(payload: &Value) -> Result<Option<Decimal>, PayloadError> {
    let raw = match payload.get("amount") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => return Err(PayloadError::InvalidAmount(other.to_string())),
    };

    let mut amount = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
        .or_else(|| round_tiny_scientific(&raw))
        .ok_or_else(|| PayloadError::InvalidAmount(raw.clone()))?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if amount.abs() > MAX_AMOUNT {
        return Err(PayloadError::InvalidAmount(raw));
    }
    // Same scale Postgres hands back for NUMERIC(10, 2)
    amount.rescale(2);
    Ok(Some(amount))
}

/// Rounds `<mantissa>e<exponent>` to cents when the negative exponent pushes
/// the scale past the 28 digits `Decimal` can hold.
fn round_tiny_scientific(raw: &str) -> Option<Decimal> {
    let (mantissa, exponent) = raw.split_once(|c| c == 'e' || c == 'E')?;
    let mantissa = Decimal::from_str(mantissa).ok()?;
    let exponent: i64 = exponent.parse().ok()?;
    if exponent >= 0 {
        return None;
    }

    // Digits to drop from the integer mantissa to land on a scale of 2
    let shift = i64::from(mantissa.scale()) - exponent - 2;
    if shift <= 0 {
        return None;
    }
    // |mantissa| < 10^29, so anything shifted further rounds to zero
    if shift > 30 {
        return Some(Decimal::new(0, 2));
    }

    let units = mantissa.mantissa();
    let divisor = 10i128.pow(shift as u32);
    let mut cents = units / divisor;
    if (units % divisor).abs() * 2 >= divisor {
        cents += units.signum();
    }
    Decimal::try_from_i128_with_scale(cents, 2).ok()
}
