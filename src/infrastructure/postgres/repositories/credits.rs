use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::{insert_into, update};
use uuid::Uuid;

use crate::domain::entities::credits::{InsertSubscriptionCreditEntity, SubscriptionCreditEntity};
use crate::domain::repositories::credits::SubscriptionCreditRepository;
use crate::domain::value_objects::billing_periods;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::subscription_credits;

pub struct SubscriptionCreditPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionCreditPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionCreditRepository for SubscriptionCreditPostgres {
    async fn insert(&self, credit: InsertSubscriptionCreditEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(subscription_credits::table)
            .values(&credit)
            .returning(subscription_credits::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(id)
    }

    async fn count_unconsumed(&self, subscription_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = subscription_credits::table
            .filter(subscription_credits::subscription_id.eq(subscription_id))
            .filter(subscription_credits::attendance_id.is_null())
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn next_unconsumed(
        &self,
        subscription_id: Uuid,
    ) -> Result<Option<SubscriptionCreditEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_credits::table
            .filter(subscription_credits::subscription_id.eq(subscription_id))
            .filter(subscription_credits::attendance_id.is_null())
            .order((
                subscription_credits::date.asc(),
                subscription_credits::id.asc(),
            ))
            .select(SubscriptionCreditEntity::as_select())
            .first::<SubscriptionCreditEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn link_to_attendance(&self, credit_id: Uuid, attendance_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The is_null guard keeps a consumed credit from being stolen.
        let updated = update(subscription_credits::table)
            .filter(subscription_credits::id.eq(credit_id))
            .filter(subscription_credits::attendance_id.is_null())
            .set(subscription_credits::attendance_id.eq(attendance_id))
            .execute(&mut conn)?;

        Ok(updated == 1)
    }

    async fn claim_next_unconsumed(
        &self,
        subscription_id: Uuid,
        attendance_id: Uuid,
    ) -> Result<Option<SubscriptionCreditEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<Option<SubscriptionCreditEntity>, DieselError, _>(|tx| {
            let credit = subscription_credits::table
                .filter(subscription_credits::subscription_id.eq(subscription_id))
                .filter(subscription_credits::attendance_id.is_null())
                .order((
                    subscription_credits::date.asc(),
                    subscription_credits::id.asc(),
                ))
                .for_update()
                .select(SubscriptionCreditEntity::as_select())
                .first::<SubscriptionCreditEntity>(tx)
                .optional()?;

            let Some(mut credit) = credit else {
                return Ok(None);
            };

            update(subscription_credits::table)
                .filter(subscription_credits::id.eq(credit.id))
                .set(subscription_credits::attendance_id.eq(attendance_id))
                .execute(tx)?;

            credit.attendance_id = Some(attendance_id);
            Ok(Some(credit))
        })?;

        Ok(result)
    }

    async fn release_by_attendance(&self, attendance_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(subscription_credits::table)
            .filter(subscription_credits::attendance_id.eq(attendance_id))
            .set(subscription_credits::attendance_id.eq(None::<Uuid>))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn has_grant_in_month(
        &self,
        subscription_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<bool> {
        let (first, last) = billing_periods::month_bounds(year, month)
            .ok_or_else(|| anyhow!("month {}-{} is out of range", year, month))?;

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = subscription_credits::table
            .filter(subscription_credits::subscription_id.eq(subscription_id))
            .filter(subscription_credits::date.between(first, last))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count > 0)
    }
}
