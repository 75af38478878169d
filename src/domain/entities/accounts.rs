use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::{account_memberships, accounts, businesses};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = accounts)]
pub struct AccountEntity {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub postcode: String,
    pub city: String,
    pub country: String,
    pub invoice_to_business: Option<Uuid>,
    pub mollie_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = businesses)]
pub struct BusinessEntity {
    pub id: Uuid,
    pub name: String,
    pub registration: String,
    pub tax_registration: String,
    pub address: String,
    pub postcode: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = account_memberships)]
pub struct AccountMembershipEntity {
    pub id: Uuid,
    pub account_id: Uuid,
    pub membership_plan_id: Uuid,
    pub date_start: chrono::NaiveDate,
    pub date_end: chrono::NaiveDate,
}
