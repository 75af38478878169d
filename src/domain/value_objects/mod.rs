pub mod billing_periods;
pub mod enums;
pub mod money;
pub mod permissions;
