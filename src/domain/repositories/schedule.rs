use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::schedule::{
    ScheduleItemClasspassGroupEntity, ScheduleItemEntity, ScheduleItemSubscriptionGroupEntity,
};

#[async_trait]
#[automock]
pub trait ScheduleRepository {
    async fn find_schedule_item(
        &self,
        schedule_item_id: Uuid,
    ) -> Result<Option<ScheduleItemEntity>>;

    /// Groups the subscription plan is a member of.
    async fn subscription_groups_for_plan(&self, subscription_plan_id: Uuid) -> Result<Vec<Uuid>>;

    /// Groups the classpass plan is a member of.
    async fn classpass_groups_for_plan(&self, classpass_plan_id: Uuid) -> Result<Vec<Uuid>>;

    /// Permission rows of the given subscription groups across all schedule
    /// items.
    async fn subscription_group_permissions(
        &self,
        subscription_group_ids: Vec<Uuid>,
    ) -> Result<Vec<ScheduleItemSubscriptionGroupEntity>>;

    /// Permission rows of the given classpass groups across all schedule
    /// items.
    async fn classpass_group_permissions(
        &self,
        classpass_group_ids: Vec<Uuid>,
    ) -> Result<Vec<ScheduleItemClasspassGroupEntity>>;
}
