use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{insert_into, update};
use uuid::Uuid;

use crate::domain::entities::attendances::{AttendanceEntity, InsertAttendanceEntity};
use crate::domain::repositories::attendances::AttendanceRepository;
use crate::domain::value_objects::enums::booking_statuses::BookingStatus;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::attendances;

pub struct AttendancePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AttendancePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn non_blocking_statuses() -> Vec<&'static str> {
    vec![
        BookingStatus::Cancelled.as_str(),
        BookingStatus::Review.as_str(),
    ]
}

#[async_trait]
impl AttendanceRepository for AttendancePostgres {
    async fn find_by_id(&self, attendance_id: Uuid) -> Result<Option<AttendanceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = attendances::table
            .find(attendance_id)
            .select(AttendanceEntity::as_select())
            .first::<AttendanceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_blocking(
        &self,
        account_id: Uuid,
        schedule_item_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AttendanceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = attendances::table
            .filter(attendances::account_id.eq(account_id))
            .filter(attendances::schedule_item_id.eq(schedule_item_id))
            .filter(attendances::date.eq(date))
            .filter(attendances::booking_status.ne_all(non_blocking_statuses()))
            .order(attendances::created_at.asc())
            .select(AttendanceEntity::as_select())
            .first::<AttendanceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert_guarded(&self, attendance: InsertAttendanceEntity) -> Result<Option<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<Option<Uuid>, DieselError, _>(|tx| {
            let existing = attendances::table
                .filter(attendances::account_id.eq(attendance.account_id))
                .filter(attendances::schedule_item_id.eq(attendance.schedule_item_id))
                .filter(attendances::date.eq(attendance.date))
                .filter(attendances::booking_status.ne_all(non_blocking_statuses()))
                .select(attendances::id)
                .first::<Uuid>(tx)
                .optional()?;

            if existing.is_some() {
                return Ok(None);
            }

            let id = insert_into(attendances::table)
                .values(&attendance)
                .returning(attendances::id)
                .get_result::<Uuid>(tx)?;

            Ok(Some(id))
        });

        match result {
            Ok(id) => Ok(id),
            // The partial unique index catches what the in-transaction check
            // cannot see from a concurrent transaction.
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set_booking_status(&self, attendance_id: Uuid, status: BookingStatus) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(attendances::table)
            .filter(attendances::id.eq(attendance_id))
            .set(attendances::booking_status.eq(status.as_str()))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn count_attended_for_classpass(&self, classpass_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = attendances::table
            .filter(attendances::classpass_id.eq(classpass_id))
            .filter(attendances::booking_status.ne(BookingStatus::Cancelled.as_str()))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }
}
