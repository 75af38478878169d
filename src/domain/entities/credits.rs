use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::subscription_credits;

/// One class credit on a subscription. A credit is consumed once it is
/// linked to an attendance; consumption order is oldest grant date first.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_credits)]
pub struct SubscriptionCreditEntity {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub attendance_id: Option<Uuid>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionCreditEntity {
    pub fn is_consumed(&self) -> bool {
        self.attendance_id.is_some()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscription_credits)]
pub struct InsertSubscriptionCreditEntity {
    pub subscription_id: Uuid,
    pub attendance_id: Option<Uuid>,
    pub date: NaiveDate,
}
