use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{
    SubscriptionAltPriceEntity, SubscriptionBlockEntity, SubscriptionEntity,
    SubscriptionPauseEntity,
};

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>>;
    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<SubscriptionEntity>>;

    /// Subscriptions whose window overlaps the given month.
    async fn list_active_in_month(&self, year: i32, month: u32)
    -> Result<Vec<SubscriptionEntity>>;

    async fn pauses_for(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionPauseEntity>>;
    async fn blocks_for(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionBlockEntity>>;
    async fn alt_price_for_month(
        &self,
        subscription_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Option<SubscriptionAltPriceEntity>>;

    /// True when any subscription of the account has its registration fee
    /// marked paid, on whichever subscription that happened.
    async fn account_has_paid_registration_fee(&self, account_id: Uuid) -> Result<bool>;
    async fn mark_registration_fee_paid(&self, subscription_id: Uuid) -> Result<()>;
}
