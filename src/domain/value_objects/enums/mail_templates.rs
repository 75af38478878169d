use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MailTemplate {
    InvoiceNotification,
    InvoiceReminder,
    ClassInfoMail,
    PaymentRecurringFailed,
}

impl MailTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailTemplate::InvoiceNotification => "invoice_notification",
            MailTemplate::InvoiceReminder => "invoice_reminder",
            MailTemplate::ClassInfoMail => "class_info_mail",
            MailTemplate::PaymentRecurringFailed => "payment_recurring_failed",
        }
    }
}

impl Display for MailTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
