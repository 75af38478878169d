pub mod checkin;
pub mod collection;
pub mod credits;
pub mod invoices;
pub mod notifications;
