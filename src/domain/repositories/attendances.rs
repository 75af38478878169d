use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::attendances::{AttendanceEntity, InsertAttendanceEntity};
use crate::domain::value_objects::enums::booking_statuses::BookingStatus;

#[async_trait]
#[automock]
pub trait AttendanceRepository {
    async fn find_by_id(&self, attendance_id: Uuid) -> Result<Option<AttendanceEntity>>;

    /// The attendance that blocks another check-in for this account, class
    /// and date: any row whose status is neither CANCELLED nor REVIEW.
    async fn find_blocking(
        &self,
        account_id: Uuid,
        schedule_item_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AttendanceEntity>>;

    /// Inserts unless a blocking attendance already exists; the existence
    /// check and the insert are one atomic operation. None on conflict.
    async fn insert_guarded(&self, attendance: InsertAttendanceEntity) -> Result<Option<Uuid>>;

    async fn set_booking_status(&self, attendance_id: Uuid, status: BookingStatus) -> Result<()>;

    /// Non cancelled attendances booked on the class pass.
    async fn count_attended_for_classpass(&self, classpass_id: Uuid) -> Result<i64>;
}
