use anyhow::{Context, Result, anyhow};

use super::config_model::{Billing, Database, DotEnvyConfig, Mailer, Mollie, Scheduler};
use crate::domain::value_objects::enums::invoice_dates::InvoiceDate;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let invoice_date_raw = std::env::var("BILLING_INVOICE_DATE")
        .unwrap_or_else(|_| InvoiceDate::FirstOfMonth.as_str().to_string());
    let billing = Billing {
        subscription_invoice_group_id: std::env::var("BILLING_INVOICE_GROUP_ID")
            .expect("BILLING_INVOICE_GROUP_ID is invalid")
            .parse()
            .context("BILLING_INVOICE_GROUP_ID is invalid")?,
        invoice_date: InvoiceDate::from_str(&invoice_date_raw)
            .ok_or_else(|| anyhow!("BILLING_INVOICE_DATE is invalid: {}", invoice_date_raw))?,
        currency: std::env::var("BILLING_CURRENCY").unwrap_or_else(|_| "EUR".to_string()),
    };

    let mollie = Mollie {
        api_key: std::env::var("MOLLIE_API_KEY").expect("MOLLIE_API_KEY is invalid"),
        api_url: std::env::var("MOLLIE_API_URL")
            .unwrap_or_else(|_| "https://api.mollie.com/v2".to_string()),
        timeout_seconds: std::env::var("MOLLIE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("MOLLIE_TIMEOUT_SECONDS is invalid")?,
        webhook_url: std::env::var("MOLLIE_WEBHOOK_URL").expect("MOLLIE_WEBHOOK_URL is invalid"),
    };

    let mailer = Mailer {
        webhook_url: std::env::var("MAILER_WEBHOOK_URL").expect("MAILER_WEBHOOK_URL is invalid"),
    };

    let scheduler = Scheduler {
        tick_seconds: std::env::var("SCHEDULER_TICK_SECONDS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("SCHEDULER_TICK_SECONDS is invalid")?,
        reminder_sweep_hour: std::env::var("SCHEDULER_REMINDER_SWEEP_HOUR")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .context("SCHEDULER_REMINDER_SWEEP_HOUR is invalid")?,
        overdue_sweep_hour: std::env::var("SCHEDULER_OVERDUE_SWEEP_HOUR")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("SCHEDULER_OVERDUE_SWEEP_HOUR is invalid")?,
    };

    Ok(DotEnvyConfig {
        database,
        billing,
        mollie,
        mailer,
        scheduler,
    })
}
