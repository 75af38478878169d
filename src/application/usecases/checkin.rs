use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::usecases::notifications::Notifier;
use crate::domain::entities::attendances::{AttendanceEntity, InsertAttendanceEntity};
use crate::domain::entities::schedule::ScheduleItemEntity;
use crate::domain::repositories::attendances::AttendanceRepository;
use crate::domain::repositories::catalog::CatalogRepository;
use crate::domain::repositories::classpasses::ClasspassRepository;
use crate::domain::repositories::credits::SubscriptionCreditRepository;
use crate::domain::repositories::schedule::ScheduleRepository;
use crate::domain::repositories::subscriptions::SubscriptionRepository;
use crate::domain::value_objects::billing_periods::{self, DateInterval};
use crate::domain::value_objects::enums::attendance_types::AttendanceType;
use crate::domain::value_objects::enums::booking_statuses::BookingStatus;
use crate::domain::value_objects::enums::mail_templates::MailTemplate;
use crate::domain::value_objects::permissions::{
    ClassPermissions, merge_classpass_permissions, merge_subscription_permissions,
};

#[derive(Debug, Error)]
pub enum CheckinError {
    #[error("schedule item not found")]
    ScheduleItemNotFound,
    #[error("subscription not found")]
    SubscriptionNotFound,
    #[error("class pass not found")]
    ClasspassNotFound,
    #[error("attendance not found")]
    AttendanceNotFound,
    #[error("account is already checked in to this class")]
    AlreadyBooked,
    #[error("the funding source belongs to another account")]
    OwnershipMismatch,
    #[error("no credits left on this subscription")]
    NoCredits,
    #[error("no classes left on this class pass")]
    ClasspassExhausted,
    #[error("date falls outside the validity window")]
    OutOfValidityWindow,
    #[error("subscription is blocked on this date")]
    SubscriptionBlocked,
    #[error("subscription is paused on this date")]
    SubscriptionPaused,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UseCaseResult<T> = std::result::Result<T, CheckinError>;

/// Authorizes bookings and check-ins against a funding source and settles
/// the cost: a subscription credit or a class on the pass.
pub struct CheckinUseCase<At, Cp, S, C, Cat, Sch, N>
where
    At: AttendanceRepository + Send + Sync + 'static,
    Cp: ClasspassRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    C: SubscriptionCreditRepository + Send + Sync + 'static,
    Cat: CatalogRepository + Send + Sync + 'static,
    Sch: ScheduleRepository + Send + Sync + 'static,
    N: Notifier + 'static,
{
    attendance_repo: Arc<At>,
    classpass_repo: Arc<Cp>,
    subscription_repo: Arc<S>,
    credit_repo: Arc<C>,
    catalog_repo: Arc<Cat>,
    schedule_repo: Arc<Sch>,
    notifier: Arc<N>,
}

impl<At, Cp, S, C, Cat, Sch, N> CheckinUseCase<At, Cp, S, C, Cat, Sch, N>
where
    At: AttendanceRepository + Send + Sync + 'static,
    Cp: ClasspassRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    C: SubscriptionCreditRepository + Send + Sync + 'static,
    Cat: CatalogRepository + Send + Sync + 'static,
    Sch: ScheduleRepository + Send + Sync + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        attendance_repo: Arc<At>,
        classpass_repo: Arc<Cp>,
        subscription_repo: Arc<S>,
        credit_repo: Arc<C>,
        catalog_repo: Arc<Cat>,
        schedule_repo: Arc<Sch>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            attendance_repo,
            classpass_repo,
            subscription_repo,
            credit_repo,
            catalog_repo,
            schedule_repo,
            notifier,
        }
    }

    /// Checks an account in on a subscription. Runs the full gauntlet:
    /// double booking, ownership, credits, blocks, pauses and the validity
    /// window, then books and claims the oldest credit.
    pub async fn class_checkin_subscription(
        &self,
        account_id: Uuid,
        subscription_id: Uuid,
        schedule_item_id: Uuid,
        date: NaiveDate,
        online_booking: bool,
        booking_status: BookingStatus,
    ) -> UseCaseResult<AttendanceEntity> {
        let schedule_item = self
            .schedule_repo
            .find_schedule_item(schedule_item_id)
            .await?
            .ok_or(CheckinError::ScheduleItemNotFound)?;

        if self
            .attendance_repo
            .find_blocking(account_id, schedule_item.id, date)
            .await?
            .is_some()
        {
            return Err(CheckinError::AlreadyBooked);
        }

        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await?
            .ok_or(CheckinError::SubscriptionNotFound)?;

        if subscription.account_id != account_id {
            return Err(CheckinError::OwnershipMismatch);
        }

        let plan = self
            .catalog_repo
            .find_subscription_plan(subscription.subscription_plan_id)
            .await?
            .ok_or_else(|| {
                CheckinError::Internal(anyhow::anyhow!(
                    "subscription plan {} is missing",
                    subscription.subscription_plan_id
                ))
            })?;

        if !plan.unlimited {
            let credits = self.credit_repo.count_unconsumed(subscription.id).await?;
            if credits - 1 < 0 {
                return Err(CheckinError::NoCredits);
            }
        }

        let blocks = self.subscription_repo.blocks_for(subscription.id).await?;
        let block_intervals: Vec<DateInterval> =
            blocks.iter().map(|block| block.interval()).collect();
        if billing_periods::date_in_any(&block_intervals, date) {
            return Err(CheckinError::SubscriptionBlocked);
        }

        let pauses = self.subscription_repo.pauses_for(subscription.id).await?;
        let pause_intervals: Vec<DateInterval> =
            pauses.iter().map(|pause| pause.interval()).collect();
        if billing_periods::date_in_any(&pause_intervals, date) {
            return Err(CheckinError::SubscriptionPaused);
        }

        if !subscription.valid_on(date) {
            return Err(CheckinError::OutOfValidityWindow);
        }

        let attendance_id = self
            .attendance_repo
            .insert_guarded(InsertAttendanceEntity {
                account_id,
                schedule_item_id: schedule_item.id,
                classpass_id: None,
                subscription_id: Some(subscription.id),
                attendance_type: AttendanceType::Subscription.to_string(),
                date,
                online_booking,
                booking_status: booking_status.to_string(),
            })
            .await?
            .ok_or(CheckinError::AlreadyBooked)?;

        if !plan.unlimited {
            let claimed = self
                .credit_repo
                .claim_next_unconsumed(subscription.id, attendance_id)
                .await?;

            match claimed {
                Some(credit) => {
                    info!(
                        %attendance_id,
                        credit_id = %credit.id,
                        "checkin: credit claimed for attendance"
                    );
                }
                None => {
                    // A concurrent check-in took the last credit after our
                    // count. The booking stands, staff settles it later.
                    warn!(
                        %attendance_id,
                        subscription_id = %subscription.id,
                        "checkin: no credit left to claim, flagging for reconciliation"
                    );
                    self.attendance_repo
                        .set_booking_status(attendance_id, BookingStatus::ReconcileLater)
                        .await?;
                }
            }
        }

        info!(
            %account_id,
            %subscription_id,
            schedule_item_id = %schedule_item.id,
            %date,
            "checkin: subscription check-in booked"
        );

        self.send_info_mail(account_id, &schedule_item, date).await;

        self.attendance_repo
            .find_by_id(attendance_id)
            .await?
            .ok_or(CheckinError::AttendanceNotFound)
    }

    /// Checks an account in on a class pass and recomputes the remaining
    /// classes from the attendance count.
    pub async fn class_checkin_classpass(
        &self,
        account_id: Uuid,
        classpass_id: Uuid,
        schedule_item_id: Uuid,
        date: NaiveDate,
        online_booking: bool,
        booking_status: BookingStatus,
    ) -> UseCaseResult<AttendanceEntity> {
        let schedule_item = self
            .schedule_repo
            .find_schedule_item(schedule_item_id)
            .await?
            .ok_or(CheckinError::ScheduleItemNotFound)?;

        if self
            .attendance_repo
            .find_blocking(account_id, schedule_item.id, date)
            .await?
            .is_some()
        {
            return Err(CheckinError::AlreadyBooked);
        }

        let classpass = self
            .classpass_repo
            .find_by_id(classpass_id)
            .await?
            .ok_or(CheckinError::ClasspassNotFound)?;

        if classpass.account_id != account_id {
            return Err(CheckinError::OwnershipMismatch);
        }

        let plan = self
            .catalog_repo
            .find_classpass_plan(classpass.classpass_plan_id)
            .await?
            .ok_or_else(|| {
                CheckinError::Internal(anyhow::anyhow!(
                    "classpass plan {} is missing",
                    classpass.classpass_plan_id
                ))
            })?;

        if !plan.unlimited && classpass.classes_remaining <= 0 {
            return Err(CheckinError::ClasspassExhausted);
        }

        if !classpass.valid_on(date) {
            return Err(CheckinError::OutOfValidityWindow);
        }

        let attendance_id = self
            .attendance_repo
            .insert_guarded(InsertAttendanceEntity {
                account_id,
                schedule_item_id: schedule_item.id,
                classpass_id: Some(classpass.id),
                subscription_id: None,
                attendance_type: AttendanceType::Classpass.to_string(),
                date,
                online_booking,
                booking_status: booking_status.to_string(),
            })
            .await?
            .ok_or(CheckinError::AlreadyBooked)?;

        if !plan.unlimited {
            self.recompute_classes_remaining(classpass.id, plan.classes)
                .await?;
        }

        info!(
            %account_id,
            %classpass_id,
            schedule_item_id = %schedule_item.id,
            %date,
            "checkin: class pass check-in booked"
        );

        self.send_info_mail(account_id, &schedule_item, date).await;

        self.attendance_repo
            .find_by_id(attendance_id)
            .await?
            .ok_or(CheckinError::AttendanceNotFound)
    }

    /// Cancels a booking and hands back what it cost: the consumed credit
    /// on the subscription path, a class on the pass otherwise.
    pub async fn cancel_booking(&self, attendance_id: Uuid) -> UseCaseResult<()> {
        let attendance = self
            .attendance_repo
            .find_by_id(attendance_id)
            .await?
            .ok_or(CheckinError::AttendanceNotFound)?;

        self.attendance_repo
            .set_booking_status(attendance.id, BookingStatus::Cancelled)
            .await?;

        match AttendanceType::from_str(&attendance.attendance_type) {
            Some(AttendanceType::Subscription) => {
                self.credit_repo.release_by_attendance(attendance.id).await?;
            }
            Some(AttendanceType::Classpass) => {
                if let Some(classpass_id) = attendance.classpass_id {
                    let classpass = self
                        .classpass_repo
                        .find_by_id(classpass_id)
                        .await?
                        .ok_or(CheckinError::ClasspassNotFound)?;
                    let plan = self
                        .catalog_repo
                        .find_classpass_plan(classpass.classpass_plan_id)
                        .await?;
                    if let Some(plan) = plan {
                        if !plan.unlimited {
                            self.recompute_classes_remaining(classpass.id, plan.classes)
                                .await?;
                        }
                    }
                }
            }
            _ => {}
        }

        info!(%attendance_id, "checkin: booking cancelled");
        Ok(())
    }

    /// Per-schedule-item permissions of a subscription plan, unioned over
    /// the groups the plan belongs to.
    pub async fn subscription_class_permissions(
        &self,
        subscription_plan_id: Uuid,
    ) -> UseCaseResult<HashMap<Uuid, ClassPermissions>> {
        let group_ids = self
            .schedule_repo
            .subscription_groups_for_plan(subscription_plan_id)
            .await?;
        if group_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = self
            .schedule_repo
            .subscription_group_permissions(group_ids)
            .await?;
        Ok(merge_subscription_permissions(&rows))
    }

    /// Per-schedule-item permissions of a classpass plan.
    pub async fn classpass_class_permissions(
        &self,
        classpass_plan_id: Uuid,
    ) -> UseCaseResult<HashMap<Uuid, ClassPermissions>> {
        let group_ids = self
            .schedule_repo
            .classpass_groups_for_plan(classpass_plan_id)
            .await?;
        if group_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = self
            .schedule_repo
            .classpass_group_permissions(group_ids)
            .await?;
        Ok(merge_classpass_permissions(&rows))
    }

    /// What one class allows for a subscription plan; no grant means no
    /// permissions at all.
    pub async fn subscription_permissions_for_class(
        &self,
        subscription_plan_id: Uuid,
        schedule_item_id: Uuid,
    ) -> UseCaseResult<ClassPermissions> {
        let permissions = self
            .subscription_class_permissions(subscription_plan_id)
            .await?;
        Ok(permissions
            .get(&schedule_item_id)
            .copied()
            .unwrap_or_default())
    }

    pub async fn classpass_permissions_for_class(
        &self,
        classpass_plan_id: Uuid,
        schedule_item_id: Uuid,
    ) -> UseCaseResult<ClassPermissions> {
        let permissions = self.classpass_class_permissions(classpass_plan_id).await?;
        Ok(permissions
            .get(&schedule_item_id)
            .copied()
            .unwrap_or_default())
    }

    async fn recompute_classes_remaining(
        &self,
        classpass_id: Uuid,
        plan_classes: i32,
    ) -> UseCaseResult<()> {
        let attended = self
            .attendance_repo
            .count_attended_for_classpass(classpass_id)
            .await?;
        let remaining = (plan_classes as i64 - attended).max(0) as i32;

        self.classpass_repo
            .set_classes_remaining(classpass_id, remaining)
            .await?;

        info!(%classpass_id, remaining, "checkin: classes remaining recomputed");
        Ok(())
    }

    async fn send_info_mail(
        &self,
        account_id: Uuid,
        schedule_item: &ScheduleItemEntity,
        date: NaiveDate,
    ) {
        let context = json!({
            "account_id": account_id,
            "schedule_item_id": schedule_item.id,
            "schedule_item_name": schedule_item.name,
            "date": date,
        });

        if let Err(err) = self.notifier.send(MailTemplate::ClassInfoMail, context).await {
            warn!(
                %account_id,
                error = ?err,
                "checkin: class info mail failed to send"
            );
        }
    }
}
