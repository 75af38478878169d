use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttendanceType {
    Classpass,
    Subscription,
    Complementary,
    EventTicket,
}

impl AttendanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceType::Classpass => "CLASSPASS",
            AttendanceType::Subscription => "SUBSCRIPTION",
            AttendanceType::Complementary => "COMPLEMENTARY",
            AttendanceType::EventTicket => "EVENT_TICKET",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "CLASSPASS" => Some(AttendanceType::Classpass),
            "SUBSCRIPTION" => Some(AttendanceType::Subscription),
            "COMPLEMENTARY" => Some(AttendanceType::Complementary),
            "EVENT_TICKET" => Some(AttendanceType::EventTicket),
            _ => None,
        }
    }
}

impl Display for AttendanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
