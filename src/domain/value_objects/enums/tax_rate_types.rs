use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Whether the tax is part of the listed price or added on top of it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaxRateType {
    Inclusive,
    Exclusive,
}

impl TaxRateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxRateType::Inclusive => "IN",
            TaxRateType::Exclusive => "EX",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "IN" => Some(TaxRateType::Inclusive),
            "EX" => Some(TaxRateType::Exclusive),
            _ => None,
        }
    }
}

impl Display for TaxRateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
