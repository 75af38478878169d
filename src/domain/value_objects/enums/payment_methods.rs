use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    DirectDebit,
    Mollie,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::BankTransfer => "BANKTRANSFER",
            PaymentMethod::DirectDebit => "DIRECTDEBIT",
            PaymentMethod::Mollie => "MOLLIE",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "CASH" => Some(PaymentMethod::Cash),
            "CARD" => Some(PaymentMethod::Card),
            "BANKTRANSFER" => Some(PaymentMethod::BankTransfer),
            "DIRECTDEBIT" => Some(PaymentMethod::DirectDebit),
            "MOLLIE" => Some(PaymentMethod::Mollie),
            _ => None,
        }
    }

    /// Only gateway collected methods take part in the recurring collection run.
    pub fn is_gateway_collected(&self) -> bool {
        matches!(self, PaymentMethod::Mollie)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
