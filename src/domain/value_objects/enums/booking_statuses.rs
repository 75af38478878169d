use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Booked,
    Attending,
    Cancelled,
    Review,
    ReconcileLater,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "BOOKED",
            BookingStatus::Attending => "ATTENDING",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Review => "REVIEW",
            BookingStatus::ReconcileLater => "RECONCILE_LATER",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "BOOKED" => Some(BookingStatus::Booked),
            "ATTENDING" => Some(BookingStatus::Attending),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            "REVIEW" => Some(BookingStatus::Review),
            "RECONCILE_LATER" => Some(BookingStatus::ReconcileLater),
            _ => None,
        }
    }

    /// A review check-in may be replaced, a cancelled one may be rebooked.
    pub fn blocks_rebooking(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Review)
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
