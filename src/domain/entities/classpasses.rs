use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::value_objects::billing_periods::DateInterval;
use crate::infrastructure::postgres::schema::account_classpasses;

/// A class pass sold to an account. `classes_remaining` is recomputed in
/// full from the plan size minus non cancelled attendances.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = account_classpasses)]
pub struct AccountClasspassEntity {
    pub id: Uuid,
    pub account_id: Uuid,
    pub classpass_plan_id: Uuid,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub classes_remaining: i32,
    pub created_at: DateTime<Utc>,
}

impl AccountClasspassEntity {
    pub fn valid_on(&self, date: NaiveDate) -> bool {
        DateInterval::new(self.date_start, self.date_end).contains(date)
    }
}
