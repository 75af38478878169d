use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{delete, insert_into, update};
use uuid::Uuid;

use crate::domain::entities::invoice_items::{
    InsertInvoiceItemEntity, InsertInvoicePaymentEntity, InvoiceItemEntity, InvoicePaymentEntity,
};
use crate::domain::entities::invoices::{
    InsertInvoiceEntity, InvoiceAmounts, InvoiceEntity, InvoiceGroupEntity,
};
use crate::domain::entities::payment_logs::InsertMolliePaymentLogEntity;
use crate::domain::repositories::invoices::{InvoiceRepository, NumberReservationConflict};
use crate::domain::value_objects::enums::invoice_statuses::InvoiceStatus;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::{
    invoice_groups, invoice_items, invoice_payments, invoices, mollie_payment_logs,
};

pub struct InvoicePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl InvoicePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl InvoiceRepository for InvoicePostgres {
    async fn find_group_by_id(&self, group_id: Uuid) -> Result<Option<InvoiceGroupEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = invoice_groups::table
            .find(group_id)
            .select(InvoiceGroupEntity::as_select())
            .first::<InvoiceGroupEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn reserve_invoice_number(&self, group_id: Uuid, date_sent: NaiveDate) -> Result<String> {
        let year = date_sent.year();

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<String, DieselError, _>(|tx| {
            // The row lock serializes concurrent reservations on the group;
            // counter and numbering year never change outside this lock.
            let mut group = invoice_groups::table
                .find(group_id)
                .for_update()
                .select(InvoiceGroupEntity::as_select())
                .first::<InvoiceGroupEntity>(tx)?;

            if group.needs_year_reset(year) {
                group.next_id = 1;
            }

            let number = group.format_invoice_number(year);

            update(invoice_groups::table)
                .filter(invoice_groups::id.eq(group_id))
                .set((
                    invoice_groups::next_id.eq(group.next_id + 1),
                    invoice_groups::numbering_year.eq(year),
                ))
                .execute(tx)?;

            Ok(number)
        });

        match result {
            Ok(number) => Ok(number),
            Err(DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _)) => {
                Err(anyhow::Error::new(NumberReservationConflict))
            }
            Err(DieselError::NotFound) => Err(anyhow!("invoice group {} does not exist", group_id)),
            Err(err) => Err(err.into()),
        }
    }

    async fn insert_invoice(&self, invoice: InsertInvoiceEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(invoices::table)
            .values(&invoice)
            .returning(invoices::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(id)
    }

    async fn find_invoice_by_id(&self, invoice_id: Uuid) -> Result<Option<InvoiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = invoices::table
            .find(invoice_id)
            .select(InvoiceEntity::as_select())
            .first::<InvoiceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn set_status(&self, invoice_id: Uuid, status: InvoiceStatus) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(invoices::table)
            .filter(invoices::id.eq(invoice_id))
            .set(invoices::status.eq(status.as_str()))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn set_amounts_and_status(
        &self,
        invoice_id: Uuid,
        amounts: InvoiceAmounts,
        status: InvoiceStatus,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(invoices::table)
            .filter(invoices::id.eq(invoice_id))
            .set((
                invoices::subtotal.eq(amounts.subtotal),
                invoices::tax.eq(amounts.tax),
                invoices::total.eq(amounts.total),
                invoices::paid.eq(amounts.paid),
                invoices::balance.eq(amounts.balance),
                invoices::status.eq(status.as_str()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn items_for_invoice(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItemEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = invoice_items::table
            .filter(invoice_items::invoice_id.eq(invoice_id))
            .order(invoice_items::line_number.asc())
            .select(InvoiceItemEntity::as_select())
            .load::<InvoiceItemEntity>(&mut conn)?;

        Ok(result)
    }

    async fn insert_item(&self, item: InsertInvoiceItemEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(invoice_items::table)
            .values(&item)
            .returning(invoice_items::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(id)
    }

    async fn find_item_by_id(&self, item_id: Uuid) -> Result<Option<InvoiceItemEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = invoice_items::table
            .find(item_id)
            .select(InvoiceItemEntity::as_select())
            .first::<InvoiceItemEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(invoice_items::table.filter(invoice_items::id.eq(item_id))).execute(&mut conn)?;

        Ok(())
    }

    async fn set_item_line_number(&self, item_id: Uuid, line_number: i32) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(invoice_items::table)
            .filter(invoice_items::id.eq(item_id))
            .set(invoice_items::line_number.eq(line_number))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn payments_for_invoice(&self, invoice_id: Uuid) -> Result<Vec<InvoicePaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = invoice_payments::table
            .filter(invoice_payments::invoice_id.eq(invoice_id))
            .order(invoice_payments::date.asc())
            .select(InvoicePaymentEntity::as_select())
            .load::<InvoicePaymentEntity>(&mut conn)?;

        Ok(result)
    }

    async fn insert_payment(&self, payment: InsertInvoicePaymentEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(invoice_payments::table)
            .values(&payment)
            .returning(invoice_payments::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(id)
    }

    async fn subscription_item_exists(
        &self,
        subscription_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = invoice_items::table
            .filter(invoice_items::subscription_id.eq(subscription_id))
            .filter(invoice_items::subscription_year.eq(year))
            .filter(invoice_items::subscription_month.eq(month as i32))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count > 0)
    }

    async fn mark_overdue(&self, today: NaiveDate) -> Result<u64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(invoices::table)
            .filter(invoices::status.eq(InvoiceStatus::Sent.as_str()))
            .filter(invoices::date_due.lt(today))
            .set(invoices::status.eq(InvoiceStatus::Overdue.as_str()))
            .execute(&mut conn)?;

        Ok(updated as u64)
    }

    async fn count_reminder_eligible(&self, today: NaiveDate) -> Result<i64> {
        let cutoff = today - Duration::days(1);

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = invoices::table
            .filter(invoices::status.eq(InvoiceStatus::Overdue.as_str()))
            .filter(
                invoices::date_last_reminder
                    .is_null()
                    .or(invoices::date_last_reminder.le(cutoff)),
            )
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn set_last_reminder(&self, invoice_id: Uuid, date: NaiveDate) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(invoices::table)
            .filter(invoices::id.eq(invoice_id))
            .set(invoices::date_last_reminder.eq(Some(date)))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn insert_payment_log(&self, log: InsertMolliePaymentLogEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(mollie_payment_logs::table)
            .values(&log)
            .returning(mollie_payment_logs::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(id)
    }
}
