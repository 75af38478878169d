use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::{invoice_groups, invoices};

/// Numbering and defaults shared by the invoices in a group.
///
/// `next_id` goes up by one for every number handed out in the group.
/// Groups with `prefix_year` and `auto_reset_prefix_year` restart it at 1
/// whenever the calendar year of `date_sent` moves past `numbering_year`;
/// the year component in the number keeps the restarted sequences apart.
/// Both fields only ever change inside the reservation critical section.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = invoice_groups)]
pub struct InvoiceGroupEntity {
    pub id: Uuid,
    pub name: String,
    pub next_id: i32,
    pub numbering_year: i32,
    pub due_after_days: i32,
    pub prefix: String,
    pub prefix_year: bool,
    pub auto_reset_prefix_year: bool,
    pub terms: String,
    pub footer: String,
}

impl InvoiceGroupEntity {
    /// True when a reservation in `year` must restart the counter first.
    pub fn needs_year_reset(&self, year: i32) -> bool {
        self.prefix_year && self.auto_reset_prefix_year && self.numbering_year != year
    }

    /// Formats the number for the invoice currently being reserved, from
    /// the counter as it stands. Callers apply [`needs_year_reset`] before
    /// formatting.
    ///
    /// [`needs_year_reset`]: InvoiceGroupEntity::needs_year_reset
    pub fn format_invoice_number(&self, year: i32) -> String {
        if self.prefix_year {
            format!("{}{}{}", self.prefix, year, self.next_id)
        } else {
            format!("{}{}", self.prefix, self.next_id)
        }
    }
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = invoices)]
pub struct InvoiceEntity {
    pub id: Uuid,
    pub account_id: Uuid,
    pub business_id: Option<Uuid>,
    pub invoice_group_id: Uuid,
    pub invoice_number: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub relation_company: String,
    pub relation_company_registration: String,
    pub relation_company_tax_registration: String,
    pub relation_contact_name: String,
    pub relation_address: String,
    pub relation_postcode: String,
    pub relation_city: String,
    pub relation_country: String,
    pub summary: String,
    pub note: String,
    pub terms: String,
    pub footer: String,
    pub date_sent: NaiveDate,
    pub date_due: NaiveDate,
    pub date_last_reminder: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub paid: Decimal,
    pub balance: Decimal,
    pub credit_invoice_for: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = invoices)]
pub struct InsertInvoiceEntity {
    pub account_id: Uuid,
    pub business_id: Option<Uuid>,
    pub invoice_group_id: Uuid,
    pub invoice_number: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub relation_company: String,
    pub relation_company_registration: String,
    pub relation_company_tax_registration: String,
    pub relation_contact_name: String,
    pub relation_address: String,
    pub relation_postcode: String,
    pub relation_city: String,
    pub relation_country: String,
    pub summary: String,
    pub note: String,
    pub terms: String,
    pub footer: String,
    pub date_sent: NaiveDate,
    pub date_due: NaiveDate,
    pub date_last_reminder: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub paid: Decimal,
    pub balance: Decimal,
    pub credit_invoice_for: Option<Uuid>,
}

/// Aggregated money fields written back after every item or payment change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceAmounts {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub paid: Decimal,
    pub balance: Decimal,
}

impl InvoiceAmounts {
    pub fn zero() -> Self {
        Self {
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            paid: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }
}
