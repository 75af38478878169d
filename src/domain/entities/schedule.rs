use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::{
    classpass_group_plans, classpass_groups, schedule_item_classpass_groups,
    schedule_item_subscription_groups, schedule_items, subscription_group_plans,
    subscription_groups,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = schedule_items)]
pub struct ScheduleItemEntity {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_groups)]
pub struct SubscriptionGroupEntity {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_group_plans)]
pub struct SubscriptionGroupPlanEntity {
    pub id: Uuid,
    pub subscription_group_id: Uuid,
    pub subscription_plan_id: Uuid,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = classpass_groups)]
pub struct ClasspassGroupEntity {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = classpass_group_plans)]
pub struct ClasspassGroupPlanEntity {
    pub id: Uuid,
    pub classpass_group_id: Uuid,
    pub classpass_plan_id: Uuid,
}

/// What members of a subscription group may do on a schedule item.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = schedule_item_subscription_groups)]
pub struct ScheduleItemSubscriptionGroupEntity {
    pub id: Uuid,
    pub schedule_item_id: Uuid,
    pub subscription_group_id: Uuid,
    pub enroll: bool,
    pub shop_book: bool,
    pub attend: bool,
}

/// What members of a classpass group may do on a schedule item.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = schedule_item_classpass_groups)]
pub struct ScheduleItemClasspassGroupEntity {
    pub id: Uuid,
    pub schedule_item_id: Uuid,
    pub classpass_group_id: Uuid,
    pub shop_book: bool,
    pub attend: bool,
}
