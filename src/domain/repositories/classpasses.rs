use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::classpasses::AccountClasspassEntity;

#[async_trait]
#[automock]
pub trait ClasspassRepository {
    async fn find_by_id(&self, classpass_id: Uuid) -> Result<Option<AccountClasspassEntity>>;
    async fn set_classes_remaining(&self, classpass_id: Uuid, classes_remaining: i32)
    -> Result<()>;
}
