use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::mollie_payment_logs;

/// Audit row written for every payment created at the gateway.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = mollie_payment_logs)]
pub struct MolliePaymentLogEntity {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub mollie_payment_id: String,
    pub recurring_type: Option<String>,
    pub webhook_url: String,
    pub log_source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mollie_payment_logs)]
pub struct InsertMolliePaymentLogEntity {
    pub invoice_id: Uuid,
    pub mollie_payment_id: String,
    pub recurring_type: Option<String>,
    pub webhook_url: String,
    pub log_source: String,
}
