pub mod accounts;
pub mod attendances;
pub mod catalog;
pub mod classpasses;
pub mod credits;
pub mod invoice_items;
pub mod invoices;
pub mod payment_logs;
pub mod schedule;
pub mod subscriptions;
