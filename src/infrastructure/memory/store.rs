use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::entities::accounts::{
    AccountEntity, AccountMembershipEntity, BusinessEntity,
};
use crate::domain::entities::attendances::{AttendanceEntity, InsertAttendanceEntity};
use crate::domain::entities::catalog::{
    ClasspassPlanEntity, EventEarlybirdEntity, EventTicketEntity, EventTicketGroupDiscountEntity,
    MembershipPlanEntity, ProductEntity, ScheduleEventEntity, SubscriptionPlanEntity,
    SubscriptionPlanPriceEntity, TaxRateEntity,
};
use crate::domain::entities::classpasses::AccountClasspassEntity;
use crate::domain::entities::credits::{InsertSubscriptionCreditEntity, SubscriptionCreditEntity};
use crate::domain::entities::invoice_items::{
    InsertInvoiceItemEntity, InsertInvoicePaymentEntity, InvoiceItemEntity, InvoicePaymentEntity,
};
use crate::domain::entities::invoices::{
    InsertInvoiceEntity, InvoiceAmounts, InvoiceEntity, InvoiceGroupEntity,
};
use crate::domain::entities::payment_logs::{
    InsertMolliePaymentLogEntity, MolliePaymentLogEntity,
};
use crate::domain::entities::schedule::{
    ClasspassGroupPlanEntity, ScheduleItemClasspassGroupEntity, ScheduleItemEntity,
    ScheduleItemSubscriptionGroupEntity, SubscriptionGroupPlanEntity,
};
use crate::domain::entities::subscriptions::{
    SubscriptionAltPriceEntity, SubscriptionBlockEntity, SubscriptionEntity,
    SubscriptionPauseEntity,
};
use crate::domain::repositories::accounts::AccountRepository;
use crate::domain::repositories::attendances::AttendanceRepository;
use crate::domain::repositories::catalog::CatalogRepository;
use crate::domain::repositories::classpasses::ClasspassRepository;
use crate::domain::repositories::credits::SubscriptionCreditRepository;
use crate::domain::repositories::invoices::InvoiceRepository;
use crate::domain::repositories::schedule::ScheduleRepository;
use crate::domain::repositories::subscriptions::SubscriptionRepository;
use crate::domain::value_objects::billing_periods;
use crate::domain::value_objects::enums::booking_statuses::BookingStatus;
use crate::domain::value_objects::enums::invoice_statuses::InvoiceStatus;

/// In-memory implementation of every repository trait, guarded by a single
/// mutex. Each trait method runs as one critical section, which realizes
/// the same atomicity the postgres implementation gets from transactions
/// and row locks.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<AccountEntity>,
    businesses: Vec<BusinessEntity>,
    memberships: Vec<AccountMembershipEntity>,
    subscriptions: Vec<SubscriptionEntity>,
    pauses: Vec<SubscriptionPauseEntity>,
    blocks: Vec<SubscriptionBlockEntity>,
    alt_prices: Vec<SubscriptionAltPriceEntity>,
    credits: Vec<SubscriptionCreditEntity>,
    classpasses: Vec<AccountClasspassEntity>,
    attendances: Vec<AttendanceEntity>,
    invoice_groups: Vec<InvoiceGroupEntity>,
    invoices: Vec<InvoiceEntity>,
    invoice_items: Vec<InvoiceItemEntity>,
    invoice_payments: Vec<InvoicePaymentEntity>,
    payment_logs: Vec<MolliePaymentLogEntity>,
    tax_rates: Vec<TaxRateEntity>,
    subscription_plans: Vec<SubscriptionPlanEntity>,
    subscription_plan_prices: Vec<SubscriptionPlanPriceEntity>,
    classpass_plans: Vec<ClasspassPlanEntity>,
    products: Vec<ProductEntity>,
    membership_plans: Vec<MembershipPlanEntity>,
    schedule_events: Vec<ScheduleEventEntity>,
    event_tickets: Vec<EventTicketEntity>,
    event_earlybirds: Vec<EventEarlybirdEntity>,
    ticket_group_discounts: Vec<EventTicketGroupDiscountEntity>,
    schedule_items: Vec<ScheduleItemEntity>,
    subscription_group_plans: Vec<SubscriptionGroupPlanEntity>,
    classpass_group_plans: Vec<ClasspassGroupPlanEntity>,
    item_subscription_groups: Vec<ScheduleItemSubscriptionGroupEntity>,
    item_classpass_groups: Vec<ScheduleItemClasspassGroupEntity>,
}

fn is_blocking(attendance: &AttendanceEntity) -> bool {
    BookingStatus::from_str(&attendance.booking_status)
        .map(|status| status.blocks_rebooking())
        .unwrap_or(true)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    pub fn seed_account(&self, account: AccountEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.accounts.push(account);
        }
    }

    pub fn seed_business(&self, business: BusinessEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.businesses.push(business);
        }
    }

    pub fn seed_membership(&self, membership: AccountMembershipEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.memberships.push(membership);
        }
    }

    pub fn seed_subscription(&self, subscription: SubscriptionEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscriptions.push(subscription);
        }
    }

    pub fn seed_pause(&self, pause: SubscriptionPauseEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.pauses.push(pause);
        }
    }

    pub fn seed_block(&self, block: SubscriptionBlockEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.blocks.push(block);
        }
    }

    pub fn seed_alt_price(&self, alt_price: SubscriptionAltPriceEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.alt_prices.push(alt_price);
        }
    }

    pub fn seed_classpass(&self, classpass: AccountClasspassEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.classpasses.push(classpass);
        }
    }

    pub fn seed_invoice_group(&self, group: InvoiceGroupEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.invoice_groups.push(group);
        }
    }

    pub fn seed_tax_rate(&self, tax_rate: TaxRateEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.tax_rates.push(tax_rate);
        }
    }

    pub fn seed_subscription_plan(&self, plan: SubscriptionPlanEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscription_plans.push(plan);
        }
    }

    pub fn seed_subscription_plan_price(&self, price: SubscriptionPlanPriceEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscription_plan_prices.push(price);
        }
    }

    pub fn seed_classpass_plan(&self, plan: ClasspassPlanEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.classpass_plans.push(plan);
        }
    }

    pub fn seed_product(&self, product: ProductEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.products.push(product);
        }
    }

    pub fn seed_membership_plan(&self, plan: MembershipPlanEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.membership_plans.push(plan);
        }
    }

    pub fn seed_schedule_event(&self, event: ScheduleEventEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.schedule_events.push(event);
        }
    }

    pub fn seed_event_ticket(&self, ticket: EventTicketEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.event_tickets.push(ticket);
        }
    }

    pub fn seed_earlybird(&self, earlybird: EventEarlybirdEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.event_earlybirds.push(earlybird);
        }
    }

    pub fn seed_ticket_group_discount(&self, discount: EventTicketGroupDiscountEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.ticket_group_discounts.push(discount);
        }
    }

    pub fn seed_schedule_item(&self, item: ScheduleItemEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.schedule_items.push(item);
        }
    }

    pub fn seed_subscription_group_plan(&self, row: SubscriptionGroupPlanEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscription_group_plans.push(row);
        }
    }

    pub fn seed_classpass_group_plan(&self, row: ClasspassGroupPlanEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.classpass_group_plans.push(row);
        }
    }

    pub fn seed_item_subscription_group(&self, row: ScheduleItemSubscriptionGroupEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.item_subscription_groups.push(row);
        }
    }

    pub fn seed_item_classpass_group(&self, row: ScheduleItemClasspassGroupEntity) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.item_classpass_groups.push(row);
        }
    }

    /// All payment log rows, oldest first. The postgres side has no listing
    /// because nothing in the runtime reads the audit trail back.
    pub fn payment_logs(&self) -> Result<Vec<MolliePaymentLogEntity>> {
        let inner = self.lock()?;
        Ok(inner.payment_logs.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<AccountEntity>> {
        let inner = self.lock()?;
        Ok(inner.accounts.iter().find(|a| a.id == account_id).cloned())
    }

    async fn find_business_by_id(&self, business_id: Uuid) -> Result<Option<BusinessEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .businesses
            .iter()
            .find(|b| b.id == business_id)
            .cloned())
    }

    async fn find_membership_by_id(
        &self,
        membership_id: Uuid,
    ) -> Result<Option<AccountMembershipEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .memberships
            .iter()
            .find(|m| m.id == membership_id)
            .cloned())
    }

    async fn set_mollie_customer_id(&self, account_id: Uuid, customer_id: String) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(account) = inner.accounts.iter_mut().find(|a| a.id == account_id) {
            account.mollie_customer_id = Some(customer_id);
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceRepository for MemoryStore {
    async fn find_by_id(&self, attendance_id: Uuid) -> Result<Option<AttendanceEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .attendances
            .iter()
            .find(|a| a.id == attendance_id)
            .cloned())
    }

    async fn find_blocking(
        &self,
        account_id: Uuid,
        schedule_item_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AttendanceEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .attendances
            .iter()
            .filter(|a| {
                a.account_id == account_id
                    && a.schedule_item_id == schedule_item_id
                    && a.date == date
                    && is_blocking(a)
            })
            .min_by_key(|a| a.created_at)
            .cloned())
    }

    async fn insert_guarded(&self, attendance: InsertAttendanceEntity) -> Result<Option<Uuid>> {
        let mut inner = self.lock()?;

        let conflict = inner.attendances.iter().any(|a| {
            a.account_id == attendance.account_id
                && a.schedule_item_id == attendance.schedule_item_id
                && a.date == attendance.date
                && is_blocking(a)
        });
        if conflict {
            return Ok(None);
        }

        let id = Uuid::new_v4();
        inner.attendances.push(AttendanceEntity {
            id,
            account_id: attendance.account_id,
            schedule_item_id: attendance.schedule_item_id,
            classpass_id: attendance.classpass_id,
            subscription_id: attendance.subscription_id,
            attendance_type: attendance.attendance_type,
            date: attendance.date,
            online_booking: attendance.online_booking,
            booking_status: attendance.booking_status,
            created_at: Utc::now(),
        });
        Ok(Some(id))
    }

    async fn set_booking_status(&self, attendance_id: Uuid, status: BookingStatus) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(attendance) = inner.attendances.iter_mut().find(|a| a.id == attendance_id) {
            attendance.booking_status = status.as_str().to_string();
        }
        Ok(())
    }

    async fn count_attended_for_classpass(&self, classpass_id: Uuid) -> Result<i64> {
        let inner = self.lock()?;
        let count = inner
            .attendances
            .iter()
            .filter(|a| {
                a.classpass_id == Some(classpass_id)
                    && a.booking_status != BookingStatus::Cancelled.as_str()
            })
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn find_subscription_plan(
        &self,
        plan_id: Uuid,
    ) -> Result<Option<SubscriptionPlanEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .subscription_plans
            .iter()
            .find(|p| p.id == plan_id)
            .cloned())
    }

    async fn subscription_plan_price_on(
        &self,
        plan_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<SubscriptionPlanPriceEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .subscription_plan_prices
            .iter()
            .filter(|p| {
                p.subscription_plan_id == plan_id
                    && p.date_start <= date
                    && p.date_end.map(|end| end >= date).unwrap_or(true)
            })
            .max_by_key(|p| p.date_start)
            .cloned())
    }

    async fn find_classpass_plan(&self, plan_id: Uuid) -> Result<Option<ClasspassPlanEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .classpass_plans
            .iter()
            .find(|p| p.id == plan_id)
            .cloned())
    }

    async fn find_product(&self, product_id: Uuid) -> Result<Option<ProductEntity>> {
        let inner = self.lock()?;
        Ok(inner.products.iter().find(|p| p.id == product_id).cloned())
    }

    async fn find_membership_plan(&self, plan_id: Uuid) -> Result<Option<MembershipPlanEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .membership_plans
            .iter()
            .find(|p| p.id == plan_id)
            .cloned())
    }

    async fn find_tax_rate(&self, tax_rate_id: Uuid) -> Result<Option<TaxRateEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .tax_rates
            .iter()
            .find(|r| r.id == tax_rate_id)
            .cloned())
    }

    async fn find_event_ticket(&self, ticket_id: Uuid) -> Result<Option<EventTicketEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .event_tickets
            .iter()
            .find(|t| t.id == ticket_id)
            .cloned())
    }

    async fn find_schedule_event(&self, event_id: Uuid) -> Result<Option<ScheduleEventEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .schedule_events
            .iter()
            .find(|e| e.id == event_id)
            .cloned())
    }

    async fn earlybirds_on_date(
        &self,
        schedule_event_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<EventEarlybirdEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .event_earlybirds
            .iter()
            .filter(|e| {
                e.schedule_event_id == schedule_event_id
                    && e.date_start <= date
                    && e.date_end >= date
            })
            .cloned()
            .collect())
    }

    async fn ticket_group_discounts(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<EventTicketGroupDiscountEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .ticket_group_discounts
            .iter()
            .filter(|d| d.event_ticket_id == ticket_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn find_schedule_item(
        &self,
        schedule_item_id: Uuid,
    ) -> Result<Option<ScheduleItemEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .schedule_items
            .iter()
            .find(|i| i.id == schedule_item_id)
            .cloned())
    }

    async fn subscription_groups_for_plan(&self, subscription_plan_id: Uuid) -> Result<Vec<Uuid>> {
        let inner = self.lock()?;
        Ok(inner
            .subscription_group_plans
            .iter()
            .filter(|row| row.subscription_plan_id == subscription_plan_id)
            .map(|row| row.subscription_group_id)
            .collect())
    }

    async fn classpass_groups_for_plan(&self, classpass_plan_id: Uuid) -> Result<Vec<Uuid>> {
        let inner = self.lock()?;
        Ok(inner
            .classpass_group_plans
            .iter()
            .filter(|row| row.classpass_plan_id == classpass_plan_id)
            .map(|row| row.classpass_group_id)
            .collect())
    }

    async fn subscription_group_permissions(
        &self,
        subscription_group_ids: Vec<Uuid>,
    ) -> Result<Vec<ScheduleItemSubscriptionGroupEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .item_subscription_groups
            .iter()
            .filter(|row| subscription_group_ids.contains(&row.subscription_group_id))
            .cloned()
            .collect())
    }

    async fn classpass_group_permissions(
        &self,
        classpass_group_ids: Vec<Uuid>,
    ) -> Result<Vec<ScheduleItemClasspassGroupEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .item_classpass_groups
            .iter()
            .filter(|row| classpass_group_ids.contains(&row.classpass_group_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .subscriptions
            .iter()
            .find(|s| s.id == subscription_id)
            .cloned())
    }

    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<SubscriptionEntity>> {
        let inner = self.lock()?;
        let mut subscriptions: Vec<_> = inner
            .subscriptions
            .iter()
            .filter(|s| s.account_id == account_id)
            .cloned()
            .collect();
        subscriptions.sort_by_key(|s| s.date_start);
        Ok(subscriptions)
    }

    async fn list_active_in_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<SubscriptionEntity>> {
        let (first, last) = billing_periods::month_bounds(year, month)
            .ok_or_else(|| anyhow!("month {}-{} is out of range", year, month))?;

        let inner = self.lock()?;
        let mut subscriptions: Vec<_> = inner
            .subscriptions
            .iter()
            .filter(|s| {
                s.date_start <= last && s.date_end.map(|end| end >= first).unwrap_or(true)
            })
            .cloned()
            .collect();
        subscriptions.sort_by_key(|s| s.created_at);
        Ok(subscriptions)
    }

    async fn pauses_for(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionPauseEntity>> {
        let inner = self.lock()?;
        let mut pauses: Vec<_> = inner
            .pauses
            .iter()
            .filter(|p| p.subscription_id == subscription_id)
            .cloned()
            .collect();
        pauses.sort_by_key(|p| p.date_start);
        Ok(pauses)
    }

    async fn blocks_for(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionBlockEntity>> {
        let inner = self.lock()?;
        let mut blocks: Vec<_> = inner
            .blocks
            .iter()
            .filter(|b| b.subscription_id == subscription_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.date_start);
        Ok(blocks)
    }

    async fn alt_price_for_month(
        &self,
        subscription_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Option<SubscriptionAltPriceEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .alt_prices
            .iter()
            .find(|p| {
                p.subscription_id == subscription_id
                    && p.subscription_year == year
                    && p.subscription_month == month as i32
            })
            .cloned())
    }

    async fn account_has_paid_registration_fee(&self, account_id: Uuid) -> Result<bool> {
        let inner = self.lock()?;
        Ok(inner
            .subscriptions
            .iter()
            .any(|s| s.account_id == account_id && s.registration_fee_paid))
    }

    async fn mark_registration_fee_paid(&self, subscription_id: Uuid) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(subscription) = inner
            .subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id)
        {
            subscription.registration_fee_paid = true;
        }
        Ok(())
    }
}

#[async_trait]
impl ClasspassRepository for MemoryStore {
    async fn find_by_id(&self, classpass_id: Uuid) -> Result<Option<AccountClasspassEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .classpasses
            .iter()
            .find(|c| c.id == classpass_id)
            .cloned())
    }

    async fn set_classes_remaining(&self, classpass_id: Uuid, classes_remaining: i32) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(classpass) = inner.classpasses.iter_mut().find(|c| c.id == classpass_id) {
            classpass.classes_remaining = classes_remaining;
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionCreditRepository for MemoryStore {
    async fn insert(&self, credit: InsertSubscriptionCreditEntity) -> Result<Uuid> {
        let mut inner = self.lock()?;
        let id = Uuid::new_v4();
        inner.credits.push(SubscriptionCreditEntity {
            id,
            subscription_id: credit.subscription_id,
            attendance_id: credit.attendance_id,
            date: credit.date,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn count_unconsumed(&self, subscription_id: Uuid) -> Result<i64> {
        let inner = self.lock()?;
        let count = inner
            .credits
            .iter()
            .filter(|c| c.subscription_id == subscription_id && c.attendance_id.is_none())
            .count();
        Ok(count as i64)
    }

    async fn next_unconsumed(
        &self,
        subscription_id: Uuid,
    ) -> Result<Option<SubscriptionCreditEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .credits
            .iter()
            .filter(|c| c.subscription_id == subscription_id && c.attendance_id.is_none())
            .min_by_key(|c| (c.date, c.id))
            .cloned())
    }

    async fn link_to_attendance(&self, credit_id: Uuid, attendance_id: Uuid) -> Result<bool> {
        let mut inner = self.lock()?;
        match inner.credits.iter_mut().find(|c| c.id == credit_id) {
            Some(credit) if credit.attendance_id.is_none() => {
                credit.attendance_id = Some(attendance_id);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(anyhow!("credit {} does not exist", credit_id)),
        }
    }

    async fn claim_next_unconsumed(
        &self,
        subscription_id: Uuid,
        attendance_id: Uuid,
    ) -> Result<Option<SubscriptionCreditEntity>> {
        let mut inner = self.lock()?;
        let next = inner
            .credits
            .iter_mut()
            .filter(|c| c.subscription_id == subscription_id && c.attendance_id.is_none())
            .min_by_key(|c| (c.date, c.id));

        match next {
            Some(credit) => {
                credit.attendance_id = Some(attendance_id);
                Ok(Some(credit.clone()))
            }
            None => Ok(None),
        }
    }

    async fn release_by_attendance(&self, attendance_id: Uuid) -> Result<()> {
        let mut inner = self.lock()?;
        for credit in inner
            .credits
            .iter_mut()
            .filter(|c| c.attendance_id == Some(attendance_id))
        {
            credit.attendance_id = None;
        }
        Ok(())
    }

    async fn has_grant_in_month(
        &self,
        subscription_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<bool> {
        let (first, last) = billing_periods::month_bounds(year, month)
            .ok_or_else(|| anyhow!("month {}-{} is out of range", year, month))?;

        let inner = self.lock()?;
        Ok(inner.credits.iter().any(|c| {
            c.subscription_id == subscription_id && c.date >= first && c.date <= last
        }))
    }
}

#[async_trait]
impl InvoiceRepository for MemoryStore {
    async fn find_group_by_id(&self, group_id: Uuid) -> Result<Option<InvoiceGroupEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .invoice_groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned())
    }

    async fn reserve_invoice_number(&self, group_id: Uuid, date_sent: NaiveDate) -> Result<String> {
        // One critical section covers the year reset, the formatting and
        // the counter increment.
        let mut inner = self.lock()?;
        let year = date_sent.year();

        let group = inner
            .invoice_groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| anyhow!("invoice group {} does not exist", group_id))?;

        if group.needs_year_reset(year) {
            group.next_id = 1;
        }

        let number = group.format_invoice_number(year);
        group.next_id += 1;
        group.numbering_year = year;

        Ok(number)
    }

    async fn insert_invoice(&self, invoice: InsertInvoiceEntity) -> Result<Uuid> {
        let mut inner = self.lock()?;
        let id = Uuid::new_v4();
        inner.invoices.push(InvoiceEntity {
            id,
            account_id: invoice.account_id,
            business_id: invoice.business_id,
            invoice_group_id: invoice.invoice_group_id,
            invoice_number: invoice.invoice_number,
            status: invoice.status,
            payment_method: invoice.payment_method,
            relation_company: invoice.relation_company,
            relation_company_registration: invoice.relation_company_registration,
            relation_company_tax_registration: invoice.relation_company_tax_registration,
            relation_contact_name: invoice.relation_contact_name,
            relation_address: invoice.relation_address,
            relation_postcode: invoice.relation_postcode,
            relation_city: invoice.relation_city,
            relation_country: invoice.relation_country,
            summary: invoice.summary,
            note: invoice.note,
            terms: invoice.terms,
            footer: invoice.footer,
            date_sent: invoice.date_sent,
            date_due: invoice.date_due,
            date_last_reminder: invoice.date_last_reminder,
            subtotal: invoice.subtotal,
            tax: invoice.tax,
            total: invoice.total,
            paid: invoice.paid,
            balance: invoice.balance,
            credit_invoice_for: invoice.credit_invoice_for,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn find_invoice_by_id(&self, invoice_id: Uuid) -> Result<Option<InvoiceEntity>> {
        let inner = self.lock()?;
        Ok(inner.invoices.iter().find(|i| i.id == invoice_id).cloned())
    }

    async fn set_status(&self, invoice_id: Uuid, status: InvoiceStatus) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(invoice) = inner.invoices.iter_mut().find(|i| i.id == invoice_id) {
            invoice.status = status.as_str().to_string();
        }
        Ok(())
    }

    async fn set_amounts_and_status(
        &self,
        invoice_id: Uuid,
        amounts: InvoiceAmounts,
        status: InvoiceStatus,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(invoice) = inner.invoices.iter_mut().find(|i| i.id == invoice_id) {
            invoice.subtotal = amounts.subtotal;
            invoice.tax = amounts.tax;
            invoice.total = amounts.total;
            invoice.paid = amounts.paid;
            invoice.balance = amounts.balance;
            invoice.status = status.as_str().to_string();
        }
        Ok(())
    }

    async fn items_for_invoice(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItemEntity>> {
        let inner = self.lock()?;
        let mut items: Vec<_> = inner
            .invoice_items
            .iter()
            .filter(|item| item.invoice_id == invoice_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.line_number);
        Ok(items)
    }

    async fn insert_item(&self, item: InsertInvoiceItemEntity) -> Result<Uuid> {
        let mut inner = self.lock()?;
        let id = Uuid::new_v4();
        inner.invoice_items.push(InvoiceItemEntity {
            id,
            invoice_id: item.invoice_id,
            subscription_id: item.subscription_id,
            subscription_year: item.subscription_year,
            subscription_month: item.subscription_month,
            classpass_id: item.classpass_id,
            membership_id: item.membership_id,
            product_id: item.product_id,
            event_ticket_id: item.event_ticket_id,
            line_number: item.line_number,
            product_name: item.product_name,
            description: item.description,
            quantity: item.quantity,
            price: item.price,
            subtotal: item.subtotal,
            tax: item.tax,
            total: item.total,
            tax_rate_id: item.tax_rate_id,
            gl_account_id: item.gl_account_id,
            cost_center_id: item.cost_center_id,
        });
        Ok(id)
    }

    async fn find_item_by_id(&self, item_id: Uuid) -> Result<Option<InvoiceItemEntity>> {
        let inner = self.lock()?;
        Ok(inner
            .invoice_items
            .iter()
            .find(|item| item.id == item_id)
            .cloned())
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<()> {
        let mut inner = self.lock()?;
        inner.invoice_items.retain(|item| item.id != item_id);
        Ok(())
    }

    async fn set_item_line_number(&self, item_id: Uuid, line_number: i32) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(item) = inner.invoice_items.iter_mut().find(|item| item.id == item_id) {
            item.line_number = line_number;
        }
        Ok(())
    }

    async fn payments_for_invoice(&self, invoice_id: Uuid) -> Result<Vec<InvoicePaymentEntity>> {
        let inner = self.lock()?;
        let mut payments: Vec<_> = inner
            .invoice_payments
            .iter()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.date);
        Ok(payments)
    }

    async fn insert_payment(&self, payment: InsertInvoicePaymentEntity) -> Result<Uuid> {
        let mut inner = self.lock()?;
        let id = Uuid::new_v4();
        inner.invoice_payments.push(InvoicePaymentEntity {
            id,
            invoice_id: payment.invoice_id,
            date: payment.date,
            amount: payment.amount,
            payment_method: payment.payment_method,
            note: payment.note,
        });
        Ok(id)
    }

    async fn subscription_item_exists(
        &self,
        subscription_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<bool> {
        let inner = self.lock()?;
        Ok(inner.invoice_items.iter().any(|item| {
            item.subscription_id == Some(subscription_id)
                && item.subscription_year == Some(year)
                && item.subscription_month == Some(month as i32)
        }))
    }

    async fn mark_overdue(&self, today: NaiveDate) -> Result<u64> {
        let mut inner = self.lock()?;
        let mut flipped = 0;
        for invoice in inner.invoices.iter_mut().filter(|i| {
            i.status == InvoiceStatus::Sent.as_str() && i.date_due < today
        }) {
            invoice.status = InvoiceStatus::Overdue.as_str().to_string();
            flipped += 1;
        }
        Ok(flipped)
    }

    async fn count_reminder_eligible(&self, today: NaiveDate) -> Result<i64> {
        let cutoff = today - Duration::days(1);
        let inner = self.lock()?;
        let count = inner
            .invoices
            .iter()
            .filter(|i| {
                i.status == InvoiceStatus::Overdue.as_str()
                    && i.date_last_reminder
                        .map(|date| date <= cutoff)
                        .unwrap_or(true)
            })
            .count();
        Ok(count as i64)
    }

    async fn set_last_reminder(&self, invoice_id: Uuid, date: NaiveDate) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(invoice) = inner.invoices.iter_mut().find(|i| i.id == invoice_id) {
            invoice.date_last_reminder = Some(date);
        }
        Ok(())
    }

    async fn insert_payment_log(&self, log: InsertMolliePaymentLogEntity) -> Result<Uuid> {
        let mut inner = self.lock()?;
        let id = Uuid::new_v4();
        inner.payment_logs.push(MolliePaymentLogEntity {
            id,
            invoice_id: log.invoice_id,
            mollie_payment_id: log.mollie_payment_id,
            recurring_type: log.recurring_type,
            webhook_url: log.webhook_url,
            log_source: log.log_source,
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::value_objects::enums::attendance_types::AttendanceType;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[tokio::test]
    async fn a_consumed_credit_cannot_be_linked_again() {
        let store = MemoryStore::new();
        let subscription_id = Uuid::new_v4();
        let credit_id = store
            .insert(InsertSubscriptionCreditEntity {
                subscription_id,
                attendance_id: None,
                date: date(2026, 4, 1),
            })
            .await
            .unwrap();

        let first = store.link_to_attendance(credit_id, Uuid::new_v4()).await.unwrap();
        let second = store.link_to_attendance(credit_id, Uuid::new_v4()).await.unwrap();

        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn released_credits_keep_their_grant_date() {
        let store = MemoryStore::new();
        let subscription_id = Uuid::new_v4();
        let attendance_id = Uuid::new_v4();

        store
            .insert(InsertSubscriptionCreditEntity {
                subscription_id,
                attendance_id: None,
                date: date(2026, 4, 1),
            })
            .await
            .unwrap();
        store
            .insert(InsertSubscriptionCreditEntity {
                subscription_id,
                attendance_id: None,
                date: date(2026, 4, 5),
            })
            .await
            .unwrap();

        let claimed = store
            .claim_next_unconsumed(subscription_id, attendance_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.date, date(2026, 4, 1));

        store.release_by_attendance(attendance_id).await.unwrap();

        // The released credit is first in line again.
        let next = store
            .next_unconsumed(subscription_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.date, date(2026, 4, 1));
    }

    #[tokio::test]
    async fn guarded_insert_rejects_a_second_booking() {
        let store = MemoryStore::new();
        let account_id = Uuid::new_v4();
        let schedule_item_id = Uuid::new_v4();

        let attendance = InsertAttendanceEntity {
            account_id,
            schedule_item_id,
            classpass_id: None,
            subscription_id: Some(Uuid::new_v4()),
            attendance_type: AttendanceType::Subscription.as_str().to_string(),
            date: date(2026, 4, 10),
            online_booking: true,
            booking_status: BookingStatus::Booked.as_str().to_string(),
        };

        let first = store.insert_guarded(attendance.clone()).await.unwrap();
        let second = store.insert_guarded(attendance).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }
}
