use uuid::Uuid;

use crate::domain::value_objects::enums::invoice_dates::InvoiceDate;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub billing: Billing,
    pub mollie: Mollie,
    pub mailer: Mailer,
    pub scheduler: Scheduler,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Billing {
    /// Invoice group the monthly subscription run books into.
    pub subscription_invoice_group_id: Uuid,
    pub invoice_date: InvoiceDate,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct Mollie {
    pub api_key: String,
    pub api_url: String,
    pub timeout_seconds: u64,
    pub webhook_url: String,
}

#[derive(Debug, Clone)]
pub struct Mailer {
    pub webhook_url: String,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    pub tick_seconds: u64,
    pub reminder_sweep_hour: u32,
    pub overdue_sweep_hour: u32,
}
