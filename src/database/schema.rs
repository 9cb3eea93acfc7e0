use diesel::table;

// Defines database schema for diesel to use
table! {
    payment_webhook_states (id) {
        id -> Text,
        order_id -> Text,
        status -> Nullable<Text>,
        transaction_id -> Text,
        pm_id -> Nullable<Text>,
        amount -> Nullable<Numeric>,
        currency -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
        user_id -> Nullable<Text>,
    }
}
