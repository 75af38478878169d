use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::catalog::{
    ClasspassPlanEntity, EventEarlybirdEntity, EventTicketEntity, EventTicketGroupDiscountEntity,
    MembershipPlanEntity, ProductEntity, ScheduleEventEntity, SubscriptionPlanEntity,
    SubscriptionPlanPriceEntity, TaxRateEntity,
};

#[async_trait]
#[automock]
pub trait CatalogRepository {
    async fn find_subscription_plan(&self, plan_id: Uuid)
    -> Result<Option<SubscriptionPlanEntity>>;

    /// The plan price row whose date range covers the given date.
    async fn subscription_plan_price_on(
        &self,
        plan_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<SubscriptionPlanPriceEntity>>;

    async fn find_classpass_plan(&self, plan_id: Uuid) -> Result<Option<ClasspassPlanEntity>>;
    async fn find_product(&self, product_id: Uuid) -> Result<Option<ProductEntity>>;
    async fn find_membership_plan(&self, plan_id: Uuid) -> Result<Option<MembershipPlanEntity>>;
    async fn find_tax_rate(&self, tax_rate_id: Uuid) -> Result<Option<TaxRateEntity>>;
    async fn find_event_ticket(&self, ticket_id: Uuid) -> Result<Option<EventTicketEntity>>;
    async fn find_schedule_event(&self, event_id: Uuid) -> Result<Option<ScheduleEventEntity>>;

    /// Early bird windows of the event covering the given date.
    async fn earlybirds_on_date(
        &self,
        schedule_event_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<EventEarlybirdEntity>>;

    async fn ticket_group_discounts(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<EventTicketGroupDiscountEntity>>;
}
