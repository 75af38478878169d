use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::value_objects::billing_periods::DateInterval;
use crate::infrastructure::postgres::schema::{
    subscription_alt_prices, subscription_blocks, subscription_pauses, subscriptions,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub account_id: Uuid,
    pub subscription_plan_id: Uuid,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub payment_method: String,
    pub registration_fee_paid: bool,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    pub fn window(&self) -> DateInterval {
        DateInterval::new(self.date_start, self.date_end)
    }

    pub fn valid_on(&self, date: NaiveDate) -> bool {
        self.window().contains(date)
    }
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_pauses)]
pub struct SubscriptionPauseEntity {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub description: String,
}

impl SubscriptionPauseEntity {
    pub fn interval(&self) -> DateInterval {
        DateInterval::new(self.date_start, self.date_end)
    }
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_blocks)]
pub struct SubscriptionBlockEntity {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub description: String,
}

impl SubscriptionBlockEntity {
    pub fn interval(&self) -> DateInterval {
        DateInterval::new(self.date_start, self.date_end)
    }
}

/// Fixed price for one subscription month, overriding proration.
/// An amount of zero means the month is not billed at all.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_alt_prices)]
pub struct SubscriptionAltPriceEntity {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub subscription_year: i32,
    pub subscription_month: i32,
    pub amount: Decimal,
    pub description: String,
}
