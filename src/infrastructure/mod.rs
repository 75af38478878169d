pub mod mailer;
pub mod memory;
pub mod mollie;
pub mod postgres;
