pub mod accounts;
pub mod attendances;
pub mod catalog;
pub mod classpasses;
pub mod credits;
pub mod invoices;
pub mod schedule;
pub mod subscriptions;
