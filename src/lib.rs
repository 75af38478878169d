pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::application::usecases::collection::{CollectionSettings, CollectionUseCase};
use crate::application::usecases::credits::CreditUseCase;
use crate::application::usecases::invoices::InvoiceUseCase;
use crate::config::config_loader;
use crate::infrastructure::mailer::webhook_mailer::WebhookMailer;
use crate::infrastructure::mollie::client::MollieClient;
use crate::infrastructure::postgres::postgres_connection;
use crate::infrastructure::postgres::repositories::accounts::AccountPostgres;
use crate::infrastructure::postgres::repositories::catalog::CatalogPostgres;
use crate::infrastructure::postgres::repositories::classpasses::ClasspassPostgres;
use crate::infrastructure::postgres::repositories::credits::SubscriptionCreditPostgres;
use crate::infrastructure::postgres::repositories::invoices::InvoicePostgres;
use crate::infrastructure::postgres::repositories::schedule::SchedulePostgres;
use crate::infrastructure::postgres::repositories::subscriptions::SubscriptionPostgres;
use crate::scheduler::BillingScheduler;

pub fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let config = config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&config.database.url)?;
    info!("Postgres connection has been established");

    let db_pool = Arc::new(postgres_pool);

    let account_repo = Arc::new(AccountPostgres::new(Arc::clone(&db_pool)));
    let catalog_repo = Arc::new(CatalogPostgres::new(Arc::clone(&db_pool)));
    let classpass_repo = Arc::new(ClasspassPostgres::new(Arc::clone(&db_pool)));
    let credit_repo = Arc::new(SubscriptionCreditPostgres::new(Arc::clone(&db_pool)));
    let invoice_repo = Arc::new(InvoicePostgres::new(Arc::clone(&db_pool)));
    let schedule_repo = Arc::new(SchedulePostgres::new(Arc::clone(&db_pool)));
    let subscription_repo = Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool)));

    let notifier = Arc::new(WebhookMailer::new(config.mailer.webhook_url.clone())?);
    let gateway = Arc::new(MollieClient::new(
        config.mollie.api_url.clone(),
        config.mollie.api_key.clone(),
        Duration::from_secs(config.mollie.timeout_seconds),
    )?);

    let invoice_usecase = Arc::new(InvoiceUseCase::new(
        Arc::clone(&account_repo),
        Arc::clone(&subscription_repo),
        Arc::clone(&classpass_repo),
        Arc::clone(&invoice_repo),
        Arc::clone(&catalog_repo),
        Arc::clone(&schedule_repo),
        Arc::clone(&notifier),
        config.billing.subscription_invoice_group_id,
    ));

    let credit_usecase = Arc::new(CreditUseCase::new(
        Arc::clone(&subscription_repo),
        Arc::clone(&credit_repo),
        Arc::clone(&catalog_repo),
    ));

    let collection_usecase = Arc::new(CollectionUseCase::new(
        Arc::clone(&invoice_usecase),
        Arc::clone(&account_repo),
        Arc::clone(&subscription_repo),
        Arc::clone(&invoice_repo),
        gateway,
        Arc::clone(&notifier),
        CollectionSettings {
            currency: config.billing.currency.clone(),
            webhook_url: config.mollie.webhook_url.clone(),
            invoice_date: config.billing.invoice_date,
        },
    ));

    info!("Billing worker started");

    let scheduler = BillingScheduler::new(
        invoice_usecase,
        credit_usecase,
        collection_usecase,
        config.scheduler.clone(),
    );
    let scheduler_loop = tokio::spawn(scheduler.run());

    scheduler_loop.await??;

    Ok(())
}
