use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Which date a batch created subscription invoice carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvoiceDate {
    Today,
    FirstOfMonth,
}

impl InvoiceDate {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceDate::Today => "today",
            InvoiceDate::FirstOfMonth => "first_of_month",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "today" => Some(InvoiceDate::Today),
            "first_of_month" => Some(InvoiceDate::FirstOfMonth),
            _ => None,
        }
    }
}

impl Display for InvoiceDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
