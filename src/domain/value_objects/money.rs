use rust_decimal::prelude::*;

/// Quantize an amount to 2 decimal places, rounding halves away from zero.
/// Every derived amount (proration, tax, line totals) goes through here.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price for a partial month: the full price scaled by billable days.
pub fn prorate(full_price: Decimal, billable_days: u32, month_days: u32) -> Decimal {
    if month_days == 0 {
        return Decimal::ZERO;
    }

    round2(full_price * Decimal::from(billable_days) / Decimal::from(month_days))
}

/// Whole credits for a partial month, halves rounded up.
pub fn prorated_credits(classes: i64, billable_days: u32, month_days: u32) -> i64 {
    if month_days == 0 {
        return 0;
    }

    let credits = Decimal::from(classes) * Decimal::from(billable_days) / Decimal::from(month_days);
    credits
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Percentage share of an amount at 2 decimal places, used for exclusive
/// tax and for discount lines.
pub fn percentage_of(amount: Decimal, percentage: Decimal) -> Decimal {
    round2(amount * percentage / Decimal::from(100))
}
