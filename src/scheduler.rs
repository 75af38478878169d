use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Timelike, Utc};
use tracing::{error, info};

use crate::application::usecases::collection::{CollectionUseCase, MollieGateway};
use crate::application::usecases::credits::CreditUseCase;
use crate::application::usecases::invoices::InvoiceUseCase;
use crate::application::usecases::notifications::Notifier;
use crate::config::config_model::Scheduler as SchedulerSettings;
use crate::domain::repositories::accounts::AccountRepository;
use crate::domain::repositories::catalog::CatalogRepository;
use crate::domain::repositories::classpasses::ClasspassRepository;
use crate::domain::repositories::credits::SubscriptionCreditRepository;
use crate::domain::repositories::invoices::InvoiceRepository;
use crate::domain::repositories::schedule::ScheduleRepository;
use crate::domain::repositories::subscriptions::SubscriptionRepository;

/// Drives the recurring billing work off a plain tick loop: the monthly
/// billing cycle on the first of the month, the overdue and reminder
/// sweeps once a day after their configured hour.
///
/// Every job is idempotent on the store side, so a crashed run is simply
/// picked up again on a later tick. All clock reads are UTC.
pub struct BillingScheduler<A, S, Cp, I, Cat, Sch, N, C, G>
where
    A: AccountRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Cp: ClasspassRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    Cat: CatalogRepository + Send + Sync + 'static,
    Sch: ScheduleRepository + Send + Sync + 'static,
    N: Notifier + 'static,
    C: SubscriptionCreditRepository + Send + Sync + 'static,
    G: MollieGateway + 'static,
{
    invoice_usecase: Arc<InvoiceUseCase<A, S, Cp, I, Cat, Sch, N>>,
    credit_usecase: Arc<CreditUseCase<S, C, Cat>>,
    collection_usecase: Arc<CollectionUseCase<A, S, Cp, I, Cat, Sch, N, G>>,
    settings: SchedulerSettings,
    last_monthly_run: Option<(i32, u32)>,
    last_overdue_sweep: Option<NaiveDate>,
    last_reminder_sweep: Option<NaiveDate>,
}

impl<A, S, Cp, I, Cat, Sch, N, C, G> BillingScheduler<A, S, Cp, I, Cat, Sch, N, C, G>
where
    A: AccountRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Cp: ClasspassRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    Cat: CatalogRepository + Send + Sync + 'static,
    Sch: ScheduleRepository + Send + Sync + 'static,
    N: Notifier + 'static,
    C: SubscriptionCreditRepository + Send + Sync + 'static,
    G: MollieGateway + 'static,
{
    pub fn new(
        invoice_usecase: Arc<InvoiceUseCase<A, S, Cp, I, Cat, Sch, N>>,
        credit_usecase: Arc<CreditUseCase<S, C, Cat>>,
        collection_usecase: Arc<CollectionUseCase<A, S, Cp, I, Cat, Sch, N, G>>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            invoice_usecase,
            credit_usecase,
            collection_usecase,
            settings,
            last_monthly_run: None,
            last_overdue_sweep: None,
            last_reminder_sweep: None,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!(
            tick_seconds = self.settings.tick_seconds,
            "scheduler: loop started"
        );

        loop {
            if let Err(e) = self.tick().await {
                error!("scheduler: cycle failed: {}", e);
            }

            tokio::time::sleep(Duration::from_secs(self.settings.tick_seconds)).await;
        }
    }

    /// One pass over the due jobs. A marker is only advanced after its job
    /// succeeded, so a failed job comes up again on the next tick.
    async fn tick(&mut self) -> Result<()> {
        let now = Utc::now();
        let today = now.date_naive();
        let hour = now.hour();

        if today.day() == 1 && self.last_monthly_run != Some((today.year(), today.month())) {
            self.monthly_cycle(today).await?;
            self.last_monthly_run = Some((today.year(), today.month()));
        }

        if hour >= self.settings.overdue_sweep_hour && self.last_overdue_sweep != Some(today) {
            self.invoice_usecase.mark_overdue(today).await?;
            self.last_overdue_sweep = Some(today);
        }

        if hour >= self.settings.reminder_sweep_hour && self.last_reminder_sweep != Some(today) {
            self.invoice_usecase.reminder_eligible(today).await?;
            self.last_reminder_sweep = Some(today);
        }

        Ok(())
    }

    /// Credits first, then billing and collection, for the month that just
    /// started.
    async fn monthly_cycle(&self, today: NaiveDate) -> Result<()> {
        let year = today.year();
        let month = today.month();
        info!(year, month, "scheduler: monthly billing cycle starting");

        let grants = self
            .credit_usecase
            .grant_credits_for_month(year, month)
            .await?;
        let collection = self
            .collection_usecase
            .collect_for_month(year, month, today)
            .await?;

        info!(
            year,
            month,
            credits_granted = grants.credits_granted,
            invoices_created = collection.invoices_created,
            payments_created = collection.payments_created,
            failed = collection.failed,
            "scheduler: monthly billing cycle finished"
        );
        Ok(())
    }
}
