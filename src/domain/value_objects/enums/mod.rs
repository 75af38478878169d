pub mod attendance_types;
pub mod booking_statuses;
pub mod invoice_dates;
pub mod invoice_statuses;
pub mod mail_templates;
pub mod payment_methods;
pub mod sequence_types;
pub mod tax_rate_types;
