use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::invoice_items::{
    InsertInvoiceItemEntity, InsertInvoicePaymentEntity, InvoiceItemEntity, InvoicePaymentEntity,
};
use crate::domain::entities::invoices::{
    InsertInvoiceEntity, InvoiceAmounts, InvoiceEntity, InvoiceGroupEntity,
};
use crate::domain::entities::payment_logs::InsertMolliePaymentLogEntity;
use crate::domain::value_objects::enums::invoice_statuses::InvoiceStatus;

/// Carried inside an `anyhow` error when a concurrent reservation updated
/// the group first. The whole reservation is safe to retry.
#[derive(Debug, Error)]
#[error("invoice number reservation lost a concurrent update")]
pub struct NumberReservationConflict;

#[async_trait]
#[automock]
pub trait InvoiceRepository {
    async fn find_group_by_id(&self, group_id: Uuid) -> Result<Option<InvoiceGroupEntity>>;

    /// Reserves the next invoice number of the group for an invoice sent on
    /// `date_sent`. The year reset check, the number formatting and the
    /// `next_id` increment happen as one atomic operation; concurrent
    /// reservations never hand out the same number.
    async fn reserve_invoice_number(&self, group_id: Uuid, date_sent: NaiveDate) -> Result<String>;

    async fn insert_invoice(&self, invoice: InsertInvoiceEntity) -> Result<Uuid>;
    async fn find_invoice_by_id(&self, invoice_id: Uuid) -> Result<Option<InvoiceEntity>>;
    async fn set_status(&self, invoice_id: Uuid, status: InvoiceStatus) -> Result<()>;
    async fn set_amounts_and_status(
        &self,
        invoice_id: Uuid,
        amounts: InvoiceAmounts,
        status: InvoiceStatus,
    ) -> Result<()>;

    /// Items ordered by line number.
    async fn items_for_invoice(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItemEntity>>;
    async fn insert_item(&self, item: InsertInvoiceItemEntity) -> Result<Uuid>;
    async fn find_item_by_id(&self, item_id: Uuid) -> Result<Option<InvoiceItemEntity>>;
    async fn delete_item(&self, item_id: Uuid) -> Result<()>;
    async fn set_item_line_number(&self, item_id: Uuid, line_number: i32) -> Result<()>;

    async fn payments_for_invoice(&self, invoice_id: Uuid) -> Result<Vec<InvoicePaymentEntity>>;
    async fn insert_payment(&self, payment: InsertInvoicePaymentEntity) -> Result<Uuid>;

    /// True when any invoice already carries an item for this subscription
    /// month, regardless of invoice status.
    async fn subscription_item_exists(
        &self,
        subscription_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<bool>;

    /// Flips SENT invoices past their due date to OVERDUE; returns how many.
    async fn mark_overdue(&self, today: NaiveDate) -> Result<u64>;

    /// OVERDUE invoices with no reminder yet or a reminder at least one day
    /// old.
    async fn count_reminder_eligible(&self, today: NaiveDate) -> Result<i64>;
    async fn set_last_reminder(&self, invoice_id: Uuid, date: NaiveDate) -> Result<()>;

    async fn insert_payment_log(&self, log: InsertMolliePaymentLogEntity) -> Result<Uuid>;
}
