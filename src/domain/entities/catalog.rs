use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::{
    classpass_plans, event_earlybirds, event_ticket_group_discounts, event_tickets,
    membership_plans, products, schedule_events, subscription_plan_prices, subscription_plans,
    tax_rates,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = tax_rates)]
pub struct TaxRateEntity {
    pub id: Uuid,
    pub name: String,
    pub percentage: Decimal,
    pub rate_type: String,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_plans)]
pub struct SubscriptionPlanEntity {
    pub id: Uuid,
    pub name: String,
    pub classes: i32,
    pub unlimited: bool,
    pub registration_fee: Decimal,
    pub tax_rate_id: Option<Uuid>,
    pub gl_account_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
}

/// Subscription plan price valid for a date range, open ended when date_end
/// is null.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_plan_prices)]
pub struct SubscriptionPlanPriceEntity {
    pub id: Uuid,
    pub subscription_plan_id: Uuid,
    pub price: Decimal,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = classpass_plans)]
pub struct ClasspassPlanEntity {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub classes: i32,
    pub unlimited: bool,
    pub tax_rate_id: Option<Uuid>,
    pub gl_account_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = products)]
pub struct ProductEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub tax_rate_id: Option<Uuid>,
    pub gl_account_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = membership_plans)]
pub struct MembershipPlanEntity {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub tax_rate_id: Option<Uuid>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = schedule_events)]
pub struct ScheduleEventEntity {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = event_tickets)]
pub struct EventTicketEntity {
    pub id: Uuid,
    pub schedule_event_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub tax_rate_id: Option<Uuid>,
    pub gl_account_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
}

/// Early bird window for an event; the discount applies to tickets bought
/// while today falls inside the window.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = event_earlybirds)]
pub struct EventEarlybirdEntity {
    pub id: Uuid,
    pub schedule_event_id: Uuid,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub discount_percentage: Decimal,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = event_ticket_group_discounts)]
pub struct EventTicketGroupDiscountEntity {
    pub id: Uuid,
    pub event_ticket_id: Uuid,
    pub subscription_group_id: Uuid,
    pub discount_percentage: Decimal,
}
