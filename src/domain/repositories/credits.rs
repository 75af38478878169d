use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::credits::{InsertSubscriptionCreditEntity, SubscriptionCreditEntity};

#[async_trait]
#[automock]
pub trait SubscriptionCreditRepository {
    async fn insert(&self, credit: InsertSubscriptionCreditEntity) -> Result<Uuid>;
    async fn count_unconsumed(&self, subscription_id: Uuid) -> Result<i64>;

    /// Oldest unconsumed credit by grant date, id as tie breaker.
    async fn next_unconsumed(
        &self,
        subscription_id: Uuid,
    ) -> Result<Option<SubscriptionCreditEntity>>;

    /// Links a credit to an attendance. Ok(false) when another attendance
    /// already holds the credit.
    async fn link_to_attendance(&self, credit_id: Uuid, attendance_id: Uuid) -> Result<bool>;

    /// Finds and links the oldest unconsumed credit in one atomic step.
    /// None when the subscription has no credit left.
    async fn claim_next_unconsumed(
        &self,
        subscription_id: Uuid,
        attendance_id: Uuid,
    ) -> Result<Option<SubscriptionCreditEntity>>;

    /// Unlinks whatever credit the attendance consumed; the grant date is
    /// untouched so the credit keeps its place in the consumption order.
    async fn release_by_attendance(&self, attendance_id: Uuid) -> Result<()>;

    /// True when the subscription already received credits dated inside the
    /// given month.
    async fn has_grant_in_month(
        &self,
        subscription_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<bool>;
}
