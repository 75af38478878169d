use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Mollie payment sequence types, serialized in the wire casing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SequenceType {
    First,
    Recurring,
    Oneoff,
}

impl SequenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceType::First => "first",
            SequenceType::Recurring => "recurring",
            SequenceType::Oneoff => "oneoff",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "first" => Some(SequenceType::First),
            "recurring" => Some(SequenceType::Recurring),
            "oneoff" => Some(SequenceType::Oneoff),
            _ => None,
        }
    }
}

impl Display for SequenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
