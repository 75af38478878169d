use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::update;
use uuid::Uuid;

use crate::domain::entities::accounts::{AccountEntity, AccountMembershipEntity, BusinessEntity};
use crate::domain::repositories::accounts::AccountRepository;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::{account_memberships, accounts, businesses};

pub struct AccountPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AccountPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AccountRepository for AccountPostgres {
    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<AccountEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = accounts::table
            .find(account_id)
            .select(AccountEntity::as_select())
            .first::<AccountEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_business_by_id(&self, business_id: Uuid) -> Result<Option<BusinessEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = businesses::table
            .find(business_id)
            .select(BusinessEntity::as_select())
            .first::<BusinessEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_membership_by_id(
        &self,
        membership_id: Uuid,
    ) -> Result<Option<AccountMembershipEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = account_memberships::table
            .find(membership_id)
            .select(AccountMembershipEntity::as_select())
            .first::<AccountMembershipEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn set_mollie_customer_id(&self, account_id: Uuid, customer_id: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(accounts::table)
            .filter(accounts::id.eq(account_id))
            .set(accounts::mollie_customer_id.eq(Some(customer_id)))
            .execute(&mut conn)?;

        Ok(())
    }
}
