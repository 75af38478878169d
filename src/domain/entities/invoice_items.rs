use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::catalog::TaxRateEntity;
use crate::domain::value_objects::enums::tax_rate_types::TaxRateType;
use crate::domain::value_objects::money;
use crate::infrastructure::postgres::schema::{invoice_items, invoice_payments};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = invoice_items)]
pub struct InvoiceItemEntity {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub subscription_year: Option<i32>,
    pub subscription_month: Option<i32>,
    pub classpass_id: Option<Uuid>,
    pub membership_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub event_ticket_id: Option<Uuid>,
    pub line_number: i32,
    pub product_name: String,
    pub description: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub tax_rate_id: Option<Uuid>,
    pub gl_account_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = invoice_items)]
pub struct InsertInvoiceItemEntity {
    pub invoice_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub subscription_year: Option<i32>,
    pub subscription_month: Option<i32>,
    pub classpass_id: Option<Uuid>,
    pub membership_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub event_ticket_id: Option<Uuid>,
    pub line_number: i32,
    pub product_name: String,
    pub description: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub tax_rate_id: Option<Uuid>,
    pub gl_account_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
}

/// Derived money fields of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Derives subtotal, tax and total for a line.
///
/// Inclusive rates carve the tax out of the listed price, so the line total
/// stays exactly price times quantity. Exclusive rates add the tax on top.
pub fn line_amounts(price: Decimal, quantity: Decimal, tax_rate: Option<&TaxRateEntity>) -> LineAmounts {
    let gross = money::round2(price * quantity);

    let rate = tax_rate.and_then(|rate| {
        TaxRateType::from_str(&rate.rate_type).map(|rate_type| (rate_type, rate.percentage))
    });

    match rate {
        Some((TaxRateType::Inclusive, percentage)) => {
            let divisor = Decimal::ONE + percentage / Decimal::from(100);
            let subtotal = money::round2(gross / divisor);
            LineAmounts {
                subtotal,
                tax: gross - subtotal,
                total: gross,
            }
        }
        Some((TaxRateType::Exclusive, percentage)) => {
            let tax = money::percentage_of(gross, percentage);
            LineAmounts {
                subtotal: gross,
                tax,
                total: gross + tax,
            }
        }
        None => LineAmounts {
            subtotal: gross,
            tax: Decimal::ZERO,
            total: gross,
        },
    }
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = invoice_payments)]
pub struct InvoicePaymentEntity {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub note: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = invoice_payments)]
pub struct InsertInvoicePaymentEntity {
    pub invoice_id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn tax_rate(percentage: Decimal, rate_type: TaxRateType) -> TaxRateEntity {
        TaxRateEntity {
            id: Uuid::new_v4(),
            name: format!("BTW {percentage}%"),
            percentage,
            rate_type: rate_type.as_str().to_string(),
        }
    }

    #[test]
    fn line_without_tax_rate_has_no_tax() {
        let amounts = line_amounts(dec!(50.00), dec!(2), None);

        assert_eq!(amounts.subtotal, dec!(100.00));
        assert_eq!(amounts.tax, dec!(0));
        assert_eq!(amounts.total, dec!(100.00));
    }

    #[test]
    fn inclusive_rate_carves_tax_out_of_the_price() {
        let rate = tax_rate(dec!(21), TaxRateType::Inclusive);
        let amounts = line_amounts(dec!(121.00), dec!(1), Some(&rate));

        assert_eq!(amounts.subtotal, dec!(100.00));
        assert_eq!(amounts.tax, dec!(21.00));
        assert_eq!(amounts.total, dec!(121.00));
    }

    #[test]
    fn exclusive_rate_adds_tax_on_top() {
        let rate = tax_rate(dec!(9), TaxRateType::Exclusive);
        let amounts = line_amounts(dec!(100.00), dec!(1), Some(&rate));

        assert_eq!(amounts.subtotal, dec!(100.00));
        assert_eq!(amounts.tax, dec!(9.00));
        assert_eq!(amounts.total, dec!(109.00));
    }

    #[test]
    fn inclusive_totals_stay_consistent_after_rounding() {
        let rate = tax_rate(dec!(21), TaxRateType::Inclusive);
        let amounts = line_amounts(dec!(9.99), dec!(1), Some(&rate));

        assert_eq!(amounts.subtotal + amounts.tax, amounts.total);
        assert_eq!(amounts.total, dec!(9.99));
    }

    #[test]
    fn negative_price_lines_produce_negative_amounts() {
        let rate = tax_rate(dec!(21), TaxRateType::Inclusive);
        let amounts = line_amounts(dec!(-12.10), dec!(1), Some(&rate));

        assert_eq!(amounts.subtotal, dec!(-10.00));
        assert_eq!(amounts.tax, dec!(-2.10));
        assert_eq!(amounts.total, dec!(-12.10));
    }
}
