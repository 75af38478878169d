use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::attendances;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = attendances)]
pub struct AttendanceEntity {
    pub id: Uuid,
    pub account_id: Uuid,
    pub schedule_item_id: Uuid,
    pub classpass_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub attendance_type: String,
    pub date: NaiveDate,
    pub online_booking: bool,
    pub booking_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = attendances)]
pub struct InsertAttendanceEntity {
    pub account_id: Uuid,
    pub schedule_item_id: Uuid,
    pub classpass_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub attendance_type: String,
    pub date: NaiveDate,
    pub online_booking: bool,
    pub booking_status: String,
}
