use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::update;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{
    SubscriptionAltPriceEntity, SubscriptionBlockEntity, SubscriptionEntity,
    SubscriptionPauseEntity,
};
use crate::domain::repositories::subscriptions::SubscriptionRepository;
use crate::domain::value_objects::billing_periods;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::{
    subscription_alt_prices, subscription_blocks, subscription_pauses, subscriptions,
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .find(subscription_id)
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::account_id.eq(account_id))
            .order(subscriptions::date_start.asc())
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn list_active_in_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<SubscriptionEntity>> {
        let (first, last) = billing_periods::month_bounds(year, month)
            .ok_or_else(|| anyhow!("month {}-{} is out of range", year, month))?;

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::date_start.le(last))
            .filter(
                subscriptions::date_end
                    .is_null()
                    .or(subscriptions::date_end.ge(first)),
            )
            .order(subscriptions::created_at.asc())
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn pauses_for(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionPauseEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_pauses::table
            .filter(subscription_pauses::subscription_id.eq(subscription_id))
            .order(subscription_pauses::date_start.asc())
            .select(SubscriptionPauseEntity::as_select())
            .load::<SubscriptionPauseEntity>(&mut conn)?;

        Ok(result)
    }

    async fn blocks_for(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionBlockEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_blocks::table
            .filter(subscription_blocks::subscription_id.eq(subscription_id))
            .order(subscription_blocks::date_start.asc())
            .select(SubscriptionBlockEntity::as_select())
            .load::<SubscriptionBlockEntity>(&mut conn)?;

        Ok(result)
    }

    async fn alt_price_for_month(
        &self,
        subscription_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Option<SubscriptionAltPriceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_alt_prices::table
            .filter(subscription_alt_prices::subscription_id.eq(subscription_id))
            .filter(subscription_alt_prices::subscription_year.eq(year))
            .filter(subscription_alt_prices::subscription_month.eq(month as i32))
            .select(SubscriptionAltPriceEntity::as_select())
            .first::<SubscriptionAltPriceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn account_has_paid_registration_fee(&self, account_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = subscriptions::table
            .filter(subscriptions::account_id.eq(account_id))
            .filter(subscriptions::registration_fee_paid.eq(true))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count > 0)
    }

    async fn mark_registration_fee_paid(&self, subscription_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(subscriptions::table)
            .filter(subscriptions::id.eq(subscription_id))
            .set(subscriptions::registration_fee_paid.eq(true))
            .execute(&mut conn)?;

        Ok(())
    }
}
