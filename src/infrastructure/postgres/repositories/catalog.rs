use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::catalog::{
    ClasspassPlanEntity, EventEarlybirdEntity, EventTicketEntity, EventTicketGroupDiscountEntity,
    MembershipPlanEntity, ProductEntity, ScheduleEventEntity, SubscriptionPlanEntity,
    SubscriptionPlanPriceEntity, TaxRateEntity,
};
use crate::domain::repositories::catalog::CatalogRepository;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::{
    classpass_plans, event_earlybirds, event_ticket_group_discounts, event_tickets,
    membership_plans, products, schedule_events, subscription_plan_prices, subscription_plans,
    tax_rates,
};

pub struct CatalogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CatalogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CatalogRepository for CatalogPostgres {
    async fn find_subscription_plan(
        &self,
        plan_id: Uuid,
    ) -> Result<Option<SubscriptionPlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_plans::table
            .find(plan_id)
            .select(SubscriptionPlanEntity::as_select())
            .first::<SubscriptionPlanEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn subscription_plan_price_on(
        &self,
        plan_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<SubscriptionPlanPriceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_plan_prices::table
            .filter(subscription_plan_prices::subscription_plan_id.eq(plan_id))
            .filter(subscription_plan_prices::date_start.le(date))
            .filter(
                subscription_plan_prices::date_end
                    .is_null()
                    .or(subscription_plan_prices::date_end.ge(date)),
            )
            .order(subscription_plan_prices::date_start.desc())
            .select(SubscriptionPlanPriceEntity::as_select())
            .first::<SubscriptionPlanPriceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_classpass_plan(&self, plan_id: Uuid) -> Result<Option<ClasspassPlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = classpass_plans::table
            .find(plan_id)
            .select(ClasspassPlanEntity::as_select())
            .first::<ClasspassPlanEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_product(&self, product_id: Uuid) -> Result<Option<ProductEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = products::table
            .find(product_id)
            .select(ProductEntity::as_select())
            .first::<ProductEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_membership_plan(&self, plan_id: Uuid) -> Result<Option<MembershipPlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = membership_plans::table
            .find(plan_id)
            .select(MembershipPlanEntity::as_select())
            .first::<MembershipPlanEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_tax_rate(&self, tax_rate_id: Uuid) -> Result<Option<TaxRateEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = tax_rates::table
            .find(tax_rate_id)
            .select(TaxRateEntity::as_select())
            .first::<TaxRateEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_event_ticket(&self, ticket_id: Uuid) -> Result<Option<EventTicketEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = event_tickets::table
            .find(ticket_id)
            .select(EventTicketEntity::as_select())
            .first::<EventTicketEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_schedule_event(&self, event_id: Uuid) -> Result<Option<ScheduleEventEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = schedule_events::table
            .find(event_id)
            .select(ScheduleEventEntity::as_select())
            .first::<ScheduleEventEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn earlybirds_on_date(
        &self,
        schedule_event_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<EventEarlybirdEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = event_earlybirds::table
            .filter(event_earlybirds::schedule_event_id.eq(schedule_event_id))
            .filter(event_earlybirds::date_start.le(date))
            .filter(event_earlybirds::date_end.ge(date))
            .select(EventEarlybirdEntity::as_select())
            .load::<EventEarlybirdEntity>(&mut conn)?;

        Ok(result)
    }

    async fn ticket_group_discounts(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<EventTicketGroupDiscountEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = event_ticket_group_discounts::table
            .filter(event_ticket_group_discounts::event_ticket_id.eq(ticket_id))
            .select(EventTicketGroupDiscountEntity::as_select())
            .load::<EventTicketGroupDiscountEntity>(&mut conn)?;

        Ok(result)
    }
}
