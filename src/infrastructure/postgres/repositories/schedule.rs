use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::schedule::{
    ScheduleItemClasspassGroupEntity, ScheduleItemEntity, ScheduleItemSubscriptionGroupEntity,
};
use crate::domain::repositories::schedule::ScheduleRepository;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::{
    classpass_group_plans, schedule_item_classpass_groups, schedule_item_subscription_groups,
    schedule_items, subscription_group_plans,
};

pub struct SchedulePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SchedulePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ScheduleRepository for SchedulePostgres {
    async fn find_schedule_item(
        &self,
        schedule_item_id: Uuid,
    ) -> Result<Option<ScheduleItemEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = schedule_items::table
            .find(schedule_item_id)
            .select(ScheduleItemEntity::as_select())
            .first::<ScheduleItemEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn subscription_groups_for_plan(&self, subscription_plan_id: Uuid) -> Result<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_group_plans::table
            .filter(subscription_group_plans::subscription_plan_id.eq(subscription_plan_id))
            .select(subscription_group_plans::subscription_group_id)
            .load::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn classpass_groups_for_plan(&self, classpass_plan_id: Uuid) -> Result<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = classpass_group_plans::table
            .filter(classpass_group_plans::classpass_plan_id.eq(classpass_plan_id))
            .select(classpass_group_plans::classpass_group_id)
            .load::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn subscription_group_permissions(
        &self,
        subscription_group_ids: Vec<Uuid>,
    ) -> Result<Vec<ScheduleItemSubscriptionGroupEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = schedule_item_subscription_groups::table
            .filter(
                schedule_item_subscription_groups::subscription_group_id
                    .eq_any(subscription_group_ids),
            )
            .select(ScheduleItemSubscriptionGroupEntity::as_select())
            .load::<ScheduleItemSubscriptionGroupEntity>(&mut conn)?;

        Ok(result)
    }

    async fn classpass_group_permissions(
        &self,
        classpass_group_ids: Vec<Uuid>,
    ) -> Result<Vec<ScheduleItemClasspassGroupEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = schedule_item_classpass_groups::table
            .filter(schedule_item_classpass_groups::classpass_group_id.eq_any(classpass_group_ids))
            .select(ScheduleItemClasspassGroupEntity::as_select())
            .load::<ScheduleItemClasspassGroupEntity>(&mut conn)?;

        Ok(result)
    }
}
