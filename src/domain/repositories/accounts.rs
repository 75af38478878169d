use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::accounts::{AccountEntity, AccountMembershipEntity, BusinessEntity};

#[async_trait]
#[automock]
pub trait AccountRepository {
    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<AccountEntity>>;
    async fn find_business_by_id(&self, business_id: Uuid) -> Result<Option<BusinessEntity>>;
    async fn find_membership_by_id(
        &self,
        membership_id: Uuid,
    ) -> Result<Option<AccountMembershipEntity>>;
    async fn set_mollie_customer_id(&self, account_id: Uuid, customer_id: String) -> Result<()>;
}
