use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::entities::credits::{InsertSubscriptionCreditEntity, SubscriptionCreditEntity};
use crate::domain::repositories::catalog::CatalogRepository;
use crate::domain::repositories::credits::SubscriptionCreditRepository;
use crate::domain::repositories::subscriptions::SubscriptionRepository;
use crate::domain::value_objects::billing_periods::{self, DateInterval};
use crate::domain::value_objects::money;

#[derive(Debug, Error)]
pub enum CreditError {
    #[error("subscription not found")]
    SubscriptionNotFound,
    #[error("no credits left on this subscription")]
    NoCredits,
    #[error("credit is already linked to an attendance")]
    AlreadyConsumed,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UseCaseResult<T> = std::result::Result<T, CreditError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreditGrantSummary {
    pub subscriptions_granted: u32,
    pub credits_granted: u32,
    pub failed: u32,
}

/// Credit ledger: counts, consumes and releases class credits, and hands
/// out the monthly grants.
pub struct CreditUseCase<S, C, Cat>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: SubscriptionCreditRepository + Send + Sync + 'static,
    Cat: CatalogRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    credit_repo: Arc<C>,
    catalog_repo: Arc<Cat>,
}

impl<S, C, Cat> CreditUseCase<S, C, Cat>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: SubscriptionCreditRepository + Send + Sync + 'static,
    Cat: CatalogRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, credit_repo: Arc<C>, catalog_repo: Arc<Cat>) -> Self {
        Self {
            subscription_repo,
            credit_repo,
            catalog_repo,
        }
    }

    /// Credits the subscription can actually spend on a date. A blocked
    /// subscription has zero usable credits; the rows stay unconsumed.
    pub async fn usable_credits_total(
        &self,
        subscription_id: Uuid,
        on_date: NaiveDate,
    ) -> UseCaseResult<i64> {
        let blocks = self.subscription_repo.blocks_for(subscription_id).await?;
        let block_intervals: Vec<DateInterval> =
            blocks.iter().map(|block| block.interval()).collect();

        if billing_periods::date_in_any(&block_intervals, on_date) {
            return Ok(0);
        }

        Ok(self.credit_repo.count_unconsumed(subscription_id).await?)
    }

    /// The credit the next check-in would consume.
    pub async fn next_credit(
        &self,
        subscription_id: Uuid,
    ) -> UseCaseResult<SubscriptionCreditEntity> {
        self.credit_repo
            .next_unconsumed(subscription_id)
            .await?
            .ok_or(CreditError::NoCredits)
    }

    pub async fn consume(&self, credit_id: Uuid, attendance_id: Uuid) -> UseCaseResult<()> {
        let linked = self
            .credit_repo
            .link_to_attendance(credit_id, attendance_id)
            .await?;

        if !linked {
            return Err(CreditError::AlreadyConsumed);
        }

        info!(%credit_id, %attendance_id, "credits: credit consumed");
        Ok(())
    }

    pub async fn release(&self, attendance_id: Uuid) -> UseCaseResult<()> {
        self.credit_repo.release_by_attendance(attendance_id).await?;
        info!(%attendance_id, "credits: credit released");
        Ok(())
    }

    /// Grants every subscription active in the month its share of class
    /// credits: the plan's monthly classes scaled by billable days, rounded
    /// to whole credits. Runs more than once per month without granting
    /// twice; unlimited plans are skipped.
    pub async fn grant_credits_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> UseCaseResult<CreditGrantSummary> {
        info!(year, month, "credits: starting monthly credit grant");

        let subscriptions = self
            .subscription_repo
            .list_active_in_month(year, month)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "credits: failed to list active subscriptions");
                CreditError::Internal(err)
            })?;

        let mut summary = CreditGrantSummary::default();

        for subscription in subscriptions {
            match self
                .grant_credits_for_subscription(&subscription.id, year, month)
                .await
            {
                Ok(granted) if granted > 0 => {
                    summary.subscriptions_granted += 1;
                    summary.credits_granted += granted;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        subscription_id = %subscription.id,
                        error = ?err,
                        "credits: grant failed for subscription"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            year,
            month,
            subscriptions_granted = summary.subscriptions_granted,
            credits_granted = summary.credits_granted,
            failed = summary.failed,
            "credits: monthly credit grant finished"
        );
        Ok(summary)
    }

    async fn grant_credits_for_subscription(
        &self,
        subscription_id: &Uuid,
        year: i32,
        month: u32,
    ) -> UseCaseResult<u32> {
        let subscription = self
            .subscription_repo
            .find_by_id(*subscription_id)
            .await?
            .ok_or(CreditError::SubscriptionNotFound)?;

        let plan = self
            .catalog_repo
            .find_subscription_plan(subscription.subscription_plan_id)
            .await?
            .ok_or_else(|| {
                CreditError::Internal(anyhow::anyhow!(
                    "subscription plan {} is missing",
                    subscription.subscription_plan_id
                ))
            })?;

        if plan.unlimited {
            return Ok(0);
        }

        if self
            .credit_repo
            .has_grant_in_month(subscription.id, year, month)
            .await?
        {
            return Ok(0);
        }

        let pauses = self.subscription_repo.pauses_for(subscription.id).await?;
        let pause_intervals: Vec<DateInterval> =
            pauses.iter().map(|pause| pause.interval()).collect();

        let period = match billing_periods::billable_period(
            subscription.date_start,
            subscription.date_end,
            &pause_intervals,
            year,
            month,
        ) {
            Some(period) if period.billable_days > 0 => period,
            _ => return Ok(0),
        };

        let month_days = billing_periods::days_in_month(year, month);
        let credits = money::prorated_credits(plan.classes as i64, period.billable_days, month_days);
        if credits <= 0 {
            return Ok(0);
        }

        for _ in 0..credits {
            self.credit_repo
                .insert(InsertSubscriptionCreditEntity {
                    subscription_id: subscription.id,
                    attendance_id: None,
                    date: period.period_start,
                })
                .await?;
        }

        info!(
            subscription_id = %subscription.id,
            credits,
            "credits: granted monthly credits"
        );
        Ok(credits as u32)
    }
}
