use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::update;
use uuid::Uuid;

use crate::domain::entities::classpasses::AccountClasspassEntity;
use crate::domain::repositories::classpasses::ClasspassRepository;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::account_classpasses;

pub struct ClasspassPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ClasspassPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ClasspassRepository for ClasspassPostgres {
    async fn find_by_id(&self, classpass_id: Uuid) -> Result<Option<AccountClasspassEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = account_classpasses::table
            .find(classpass_id)
            .select(AccountClasspassEntity::as_select())
            .first::<AccountClasspassEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn set_classes_remaining(&self, classpass_id: Uuid, remaining: i32) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(account_classpasses::table)
            .filter(account_classpasses::id.eq(classpass_id))
            .set(account_classpasses::classes_remaining.eq(remaining))
            .execute(&mut conn)?;

        Ok(())
    }
}
