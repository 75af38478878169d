use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::usecases::notifications::Notifier;
use crate::domain::entities::catalog::TaxRateEntity;
use crate::domain::entities::invoice_items::{
    InsertInvoiceItemEntity, InsertInvoicePaymentEntity, InvoiceItemEntity, line_amounts,
};
use crate::domain::entities::invoices::{InsertInvoiceEntity, InvoiceAmounts, InvoiceEntity};
use crate::domain::repositories::accounts::AccountRepository;
use crate::domain::repositories::catalog::CatalogRepository;
use crate::domain::repositories::classpasses::ClasspassRepository;
use crate::domain::repositories::invoices::{InvoiceRepository, NumberReservationConflict};
use crate::domain::repositories::schedule::ScheduleRepository;
use crate::domain::repositories::subscriptions::SubscriptionRepository;
use crate::domain::value_objects::billing_periods::{self, DateInterval};
use crate::domain::value_objects::enums::invoice_dates::InvoiceDate;
use crate::domain::value_objects::enums::invoice_statuses::InvoiceStatus;
use crate::domain::value_objects::enums::mail_templates::MailTemplate;
use crate::domain::value_objects::money;

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("invoice not found")]
    InvoiceNotFound,
    #[error("invoice group not found")]
    GroupNotFound,
    #[error("account not found")]
    AccountNotFound,
    #[error("business not found")]
    BusinessNotFound,
    #[error("subscription not found")]
    SubscriptionNotFound,
    #[error("class pass not found")]
    ClasspassNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("membership not found")]
    MembershipNotFound,
    #[error("event ticket not found")]
    EventTicketNotFound,
    #[error("invoice item not found")]
    ItemNotFound,
    #[error("invoice number reservation conflicted, retry the operation")]
    NumberingConflict,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UseCaseResult<T> = std::result::Result<T, InvoiceError>;

/// Everything a new invoice needs besides relation info, which is
/// snapshotted from the account or business at creation time.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub account_id: Uuid,
    pub business_id: Option<Uuid>,
    pub invoice_group_id: Uuid,
    pub payment_method: Option<String>,
    pub summary: String,
    pub note: String,
    pub status: InvoiceStatus,
    pub date_sent: Option<NaiveDate>,
    pub credit_invoice_for: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewInvoicePayment {
    pub invoice_id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub note: String,
}

/// Builds invoices and their lines, keeps the aggregated amounts and the
/// status in step, and runs the monthly subscription billing.
pub struct InvoiceUseCase<A, S, Cp, I, Cat, Sch, N>
where
    A: AccountRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Cp: ClasspassRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    Cat: CatalogRepository + Send + Sync + 'static,
    Sch: ScheduleRepository + Send + Sync + 'static,
    N: Notifier + 'static,
{
    account_repo: Arc<A>,
    subscription_repo: Arc<S>,
    classpass_repo: Arc<Cp>,
    invoice_repo: Arc<I>,
    catalog_repo: Arc<Cat>,
    schedule_repo: Arc<Sch>,
    notifier: Arc<N>,
    subscription_invoice_group_id: Uuid,
}

impl<A, S, Cp, I, Cat, Sch, N> InvoiceUseCase<A, S, Cp, I, Cat, Sch, N>
where
    A: AccountRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Cp: ClasspassRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    Cat: CatalogRepository + Send + Sync + 'static,
    Sch: ScheduleRepository + Send + Sync + 'static,
    N: Notifier + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_repo: Arc<A>,
        subscription_repo: Arc<S>,
        classpass_repo: Arc<Cp>,
        invoice_repo: Arc<I>,
        catalog_repo: Arc<Cat>,
        schedule_repo: Arc<Sch>,
        notifier: Arc<N>,
        subscription_invoice_group_id: Uuid,
    ) -> Self {
        Self {
            account_repo,
            subscription_repo,
            classpass_repo,
            invoice_repo,
            catalog_repo,
            schedule_repo,
            notifier,
            subscription_invoice_group_id,
        }
    }

    /// Creates an invoice: snapshots relation info, derives the dates from
    /// the group and reserves the next invoice number. Invoices born SENT
    /// trigger the notification mail, best effort.
    pub async fn create_invoice(
        &self,
        new_invoice: NewInvoice,
        today: NaiveDate,
    ) -> UseCaseResult<InvoiceEntity> {
        let account = self
            .account_repo
            .find_by_id(new_invoice.account_id)
            .await?
            .ok_or(InvoiceError::AccountNotFound)?;

        let group = self
            .invoice_repo
            .find_group_by_id(new_invoice.invoice_group_id)
            .await?
            .ok_or(InvoiceError::GroupNotFound)?;

        // An account that invoices to a business gets that business on
        // every invoice unless one was picked explicitly.
        let business_id = new_invoice.business_id.or(account.invoice_to_business);
        let business = match business_id {
            Some(id) => Some(
                self.account_repo
                    .find_business_by_id(id)
                    .await?
                    .ok_or(InvoiceError::BusinessNotFound)?,
            ),
            None => None,
        };

        let mut relation_company = String::new();
        let mut relation_company_registration = String::new();
        let mut relation_company_tax_registration = String::new();
        let mut relation_contact_name = account.full_name.clone();
        let mut relation_address = account.address.clone();
        let mut relation_postcode = account.postcode.clone();
        let mut relation_city = account.city.clone();
        let mut relation_country = account.country.clone();

        if let Some(business) = &business {
            relation_company = business.name.clone();
            relation_company_registration = business.registration.clone();
            relation_company_tax_registration = business.tax_registration.clone();
            relation_contact_name = String::new();
            relation_address = business.address.clone();
            relation_postcode = business.postcode.clone();
            relation_city = business.city.clone();
            relation_country = business.country.clone();
        }

        let date_sent = new_invoice.date_sent.unwrap_or(today);
        let date_due = date_sent + Duration::days(group.due_after_days as i64);

        let invoice_number = match self
            .invoice_repo
            .reserve_invoice_number(group.id, date_sent)
            .await
        {
            Ok(number) => number,
            Err(err) if err.downcast_ref::<NumberReservationConflict>().is_some() => {
                warn!(
                    invoice_group_id = %group.id,
                    "invoices: number reservation conflicted"
                );
                return Err(InvoiceError::NumberingConflict);
            }
            Err(err) => return Err(err.into()),
        };

        let invoice_id = self
            .invoice_repo
            .insert_invoice(InsertInvoiceEntity {
                account_id: account.id,
                business_id: business.as_ref().map(|business| business.id),
                invoice_group_id: group.id,
                invoice_number: invoice_number.clone(),
                status: new_invoice.status.to_string(),
                payment_method: new_invoice.payment_method,
                relation_company,
                relation_company_registration,
                relation_company_tax_registration,
                relation_contact_name,
                relation_address,
                relation_postcode,
                relation_city,
                relation_country,
                summary: new_invoice.summary,
                note: new_invoice.note,
                terms: group.terms.clone(),
                footer: group.footer.clone(),
                date_sent,
                date_due,
                date_last_reminder: None,
                subtotal: Decimal::ZERO,
                tax: Decimal::ZERO,
                total: Decimal::ZERO,
                paid: Decimal::ZERO,
                balance: Decimal::ZERO,
                credit_invoice_for: new_invoice.credit_invoice_for,
            })
            .await?;

        let invoice = self
            .invoice_repo
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        info!(
            %invoice_id,
            invoice_number = %invoice.invoice_number,
            account_id = %invoice.account_id,
            "invoices: created invoice"
        );

        if new_invoice.status == InvoiceStatus::Sent {
            self.notify(
                MailTemplate::InvoiceNotification,
                json!({
                    "invoice_id": invoice.id,
                    "invoice_number": invoice.invoice_number,
                    "account_id": invoice.account_id,
                    "total": invoice.total,
                    "date_due": invoice.date_due,
                }),
            )
            .await;
        }

        Ok(invoice)
    }

    /// Bills one subscription month: alt prices override the prorated
    /// price outright, otherwise the plan price as of the first of the
    /// month is scaled by billable days. Adds the one-time registration
    /// fee line while the account still owes it.
    pub async fn item_add_subscription(
        &self,
        invoice_id: Uuid,
        subscription_id: Uuid,
        year: i32,
        month: u32,
        description: Option<String>,
    ) -> UseCaseResult<InvoiceItemEntity> {
        let invoice = self
            .invoice_repo
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await?
            .ok_or(InvoiceError::SubscriptionNotFound)?;

        let plan = self
            .catalog_repo
            .find_subscription_plan(subscription.subscription_plan_id)
            .await?
            .ok_or_else(|| {
                InvoiceError::Internal(anyhow::anyhow!(
                    "subscription plan {} is missing",
                    subscription.subscription_plan_id
                ))
            })?;

        let (first_day, last_day) = billing_periods::month_bounds(year, month)
            .ok_or_else(|| InvoiceError::Internal(anyhow::anyhow!("invalid month {year}-{month}")))?;

        let pauses = self.subscription_repo.pauses_for(subscription.id).await?;
        let pause_intervals: Vec<DateInterval> =
            pauses.iter().map(|pause| pause.interval()).collect();
        let period = billing_periods::billable_period(
            subscription.date_start,
            subscription.date_end,
            &pause_intervals,
            year,
            month,
        );
        let (period_start, period_end) = period
            .as_ref()
            .map(|period| (period.period_start, period.period_end))
            .unwrap_or((first_day, last_day));

        let alt_price = self
            .subscription_repo
            .alt_price_for_month(subscription.id, year, month)
            .await?;

        let (price, description) = match alt_price {
            Some(alt) => (alt.amount, alt.description),
            None => {
                let full_price = match self
                    .catalog_repo
                    .subscription_plan_price_on(plan.id, first_day)
                    .await?
                {
                    Some(row) => row.price,
                    None => {
                        warn!(
                            subscription_plan_id = %plan.id,
                            date = %first_day,
                            "invoices: no plan price configured, billing zero"
                        );
                        Decimal::ZERO
                    }
                };

                let billable_days = period.as_ref().map(|period| period.billable_days).unwrap_or(0);
                let month_days = billing_periods::days_in_month(year, month);
                let price = money::prorate(full_price, billable_days, month_days);

                let description = match description {
                    Some(text) if !text.is_empty() => text,
                    _ => format!("{} [{} - {}]", plan.name, period_start, period_end),
                };
                (price, description)
            }
        };

        let tax_rate = self.load_tax_rate(plan.tax_rate_id).await?;
        let amounts = line_amounts(price, Decimal::ONE, tax_rate.as_ref());
        let line_number = self.next_line_number(invoice.id).await?;

        let item_id = self
            .invoice_repo
            .insert_item(InsertInvoiceItemEntity {
                invoice_id: invoice.id,
                subscription_id: Some(subscription.id),
                subscription_year: Some(year),
                subscription_month: Some(month as i32),
                classpass_id: None,
                membership_id: None,
                product_id: None,
                event_ticket_id: None,
                line_number,
                product_name: format!("Subscription {}", subscription.id),
                description,
                quantity: Decimal::ONE,
                price,
                subtotal: amounts.subtotal,
                tax: amounts.tax,
                total: amounts.total,
                tax_rate_id: plan.tax_rate_id,
                gl_account_id: plan.gl_account_id,
                cost_center_id: plan.cost_center_id,
            })
            .await?;

        info!(
            %invoice_id,
            %subscription_id,
            year,
            month,
            %price,
            "invoices: added subscription item"
        );

        if plan.registration_fee > Decimal::ZERO {
            let fee_paid = self
                .subscription_repo
                .account_has_paid_registration_fee(subscription.account_id)
                .await?;

            if !fee_paid {
                let fee_amounts =
                    line_amounts(plan.registration_fee, Decimal::ONE, tax_rate.as_ref());
                let fee_line_number = self.next_line_number(invoice.id).await?;

                self.invoice_repo
                    .insert_item(InsertInvoiceItemEntity {
                        invoice_id: invoice.id,
                        subscription_id: None,
                        subscription_year: None,
                        subscription_month: None,
                        classpass_id: None,
                        membership_id: None,
                        product_id: None,
                        event_ticket_id: None,
                        line_number: fee_line_number,
                        product_name: "Registration fee".to_string(),
                        description: "One time registration fee".to_string(),
                        quantity: Decimal::ONE,
                        price: plan.registration_fee,
                        subtotal: fee_amounts.subtotal,
                        tax: fee_amounts.tax,
                        total: fee_amounts.total,
                        tax_rate_id: plan.tax_rate_id,
                        gl_account_id: None,
                        cost_center_id: None,
                    })
                    .await?;

                self.subscription_repo
                    .mark_registration_fee_paid(subscription.id)
                    .await?;

                info!(
                    %invoice_id,
                    %subscription_id,
                    fee = %plan.registration_fee,
                    "invoices: added registration fee item"
                );
            }
        }

        self.update_amounts(invoice.id).await?;
        self.find_item(item_id).await
    }

    pub async fn item_add_classpass(
        &self,
        invoice_id: Uuid,
        classpass_id: Uuid,
    ) -> UseCaseResult<InvoiceItemEntity> {
        let invoice = self
            .invoice_repo
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        let classpass = self
            .classpass_repo
            .find_by_id(classpass_id)
            .await?
            .ok_or(InvoiceError::ClasspassNotFound)?;

        let plan = self
            .catalog_repo
            .find_classpass_plan(classpass.classpass_plan_id)
            .await?
            .ok_or_else(|| {
                InvoiceError::Internal(anyhow::anyhow!(
                    "classpass plan {} is missing",
                    classpass.classpass_plan_id
                ))
            })?;

        let tax_rate = self.load_tax_rate(plan.tax_rate_id).await?;
        let amounts = line_amounts(plan.price, Decimal::ONE, tax_rate.as_ref());
        let line_number = self.next_line_number(invoice.id).await?;

        let item_id = self
            .invoice_repo
            .insert_item(InsertInvoiceItemEntity {
                invoice_id: invoice.id,
                subscription_id: None,
                subscription_year: None,
                subscription_month: None,
                classpass_id: Some(classpass.id),
                membership_id: None,
                product_id: None,
                event_ticket_id: None,
                line_number,
                product_name: "Class pass".to_string(),
                description: format!("Class pass {}\n{}", classpass.id, plan.name),
                quantity: Decimal::ONE,
                price: plan.price,
                subtotal: amounts.subtotal,
                tax: amounts.tax,
                total: amounts.total,
                tax_rate_id: plan.tax_rate_id,
                gl_account_id: plan.gl_account_id,
                cost_center_id: plan.cost_center_id,
            })
            .await?;

        info!(%invoice_id, %classpass_id, "invoices: added class pass item");

        self.update_amounts(invoice.id).await?;
        self.find_item(item_id).await
    }

    pub async fn item_add_product(
        &self,
        invoice_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    ) -> UseCaseResult<InvoiceItemEntity> {
        let invoice = self
            .invoice_repo
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        let product = self
            .catalog_repo
            .find_product(product_id)
            .await?
            .ok_or(InvoiceError::ProductNotFound)?;

        let tax_rate = self.load_tax_rate(product.tax_rate_id).await?;
        let amounts = line_amounts(product.price, quantity, tax_rate.as_ref());
        let line_number = self.next_line_number(invoice.id).await?;

        let item_id = self
            .invoice_repo
            .insert_item(InsertInvoiceItemEntity {
                invoice_id: invoice.id,
                subscription_id: None,
                subscription_year: None,
                subscription_month: None,
                classpass_id: None,
                membership_id: None,
                product_id: Some(product.id),
                event_ticket_id: None,
                line_number,
                product_name: product.name.clone(),
                description: product.description.clone(),
                quantity,
                price: product.price,
                subtotal: amounts.subtotal,
                tax: amounts.tax,
                total: amounts.total,
                tax_rate_id: product.tax_rate_id,
                gl_account_id: product.gl_account_id,
                cost_center_id: product.cost_center_id,
            })
            .await?;

        info!(%invoice_id, %product_id, %quantity, "invoices: added product item");

        self.update_amounts(invoice.id).await?;
        self.find_item(item_id).await
    }

    pub async fn item_add_membership(
        &self,
        invoice_id: Uuid,
        membership_id: Uuid,
    ) -> UseCaseResult<InvoiceItemEntity> {
        let invoice = self
            .invoice_repo
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        let membership = self
            .account_repo
            .find_membership_by_id(membership_id)
            .await?
            .ok_or(InvoiceError::MembershipNotFound)?;

        let plan = self
            .catalog_repo
            .find_membership_plan(membership.membership_plan_id)
            .await?
            .ok_or_else(|| {
                InvoiceError::Internal(anyhow::anyhow!(
                    "membership plan {} is missing",
                    membership.membership_plan_id
                ))
            })?;

        let tax_rate = self.load_tax_rate(plan.tax_rate_id).await?;
        let amounts = line_amounts(plan.price, Decimal::ONE, tax_rate.as_ref());
        let line_number = self.next_line_number(invoice.id).await?;

        let item_id = self
            .invoice_repo
            .insert_item(InsertInvoiceItemEntity {
                invoice_id: invoice.id,
                subscription_id: None,
                subscription_year: None,
                subscription_month: None,
                classpass_id: None,
                membership_id: Some(membership.id),
                product_id: None,
                event_ticket_id: None,
                line_number,
                product_name: "Membership".to_string(),
                description: plan.name.clone(),
                quantity: Decimal::ONE,
                price: plan.price,
                subtotal: amounts.subtotal,
                tax: amounts.tax,
                total: amounts.total,
                tax_rate_id: plan.tax_rate_id,
                gl_account_id: None,
                cost_center_id: None,
            })
            .await?;

        info!(%invoice_id, %membership_id, "invoices: added membership item");

        self.update_amounts(invoice.id).await?;
        self.find_item(item_id).await
    }

    /// Adds the ticket line plus, when applicable, one early bird discount
    /// line and one subscription group discount line, both negative.
    pub async fn item_add_event_ticket(
        &self,
        invoice_id: Uuid,
        ticket_id: Uuid,
        today: NaiveDate,
    ) -> UseCaseResult<InvoiceItemEntity> {
        let invoice = self
            .invoice_repo
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        let ticket = self
            .catalog_repo
            .find_event_ticket(ticket_id)
            .await?
            .ok_or(InvoiceError::EventTicketNotFound)?;

        let event = self
            .catalog_repo
            .find_schedule_event(ticket.schedule_event_id)
            .await?
            .ok_or_else(|| {
                InvoiceError::Internal(anyhow::anyhow!(
                    "schedule event {} is missing",
                    ticket.schedule_event_id
                ))
            })?;

        let tax_rate = self.load_tax_rate(ticket.tax_rate_id).await?;
        let amounts = line_amounts(ticket.price, Decimal::ONE, tax_rate.as_ref());
        let line_number = self.next_line_number(invoice.id).await?;

        let item_id = self
            .invoice_repo
            .insert_item(InsertInvoiceItemEntity {
                invoice_id: invoice.id,
                subscription_id: None,
                subscription_year: None,
                subscription_month: None,
                classpass_id: None,
                membership_id: None,
                product_id: None,
                event_ticket_id: Some(ticket.id),
                line_number,
                product_name: "Event ticket".to_string(),
                description: format!("{}\n[{}]", event.name, ticket.name),
                quantity: Decimal::ONE,
                price: ticket.price,
                subtotal: amounts.subtotal,
                tax: amounts.tax,
                total: amounts.total,
                tax_rate_id: ticket.tax_rate_id,
                gl_account_id: ticket.gl_account_id,
                cost_center_id: ticket.cost_center_id,
            })
            .await?;

        info!(%invoice_id, %ticket_id, "invoices: added event ticket item");

        let earlybird = self
            .catalog_repo
            .earlybirds_on_date(event.id, today)
            .await?
            .into_iter()
            .max_by_key(|earlybird| earlybird.discount_percentage);

        if let Some(earlybird) = earlybird {
            let discount = money::percentage_of(ticket.price, earlybird.discount_percentage);
            if discount > Decimal::ZERO {
                self.add_discount_item(
                    &invoice,
                    &ticket,
                    tax_rate.as_ref(),
                    "Event ticket earlybird discount",
                    earlybird.discount_percentage,
                    discount,
                )
                .await?;
            }
        }

        if let Some(percentage) = self
            .highest_subscription_group_discount(invoice.account_id, ticket.id, today)
            .await?
        {
            let discount = money::percentage_of(ticket.price, percentage);
            if discount > Decimal::ZERO {
                self.add_discount_item(
                    &invoice,
                    &ticket,
                    tax_rate.as_ref(),
                    "Event ticket subscription discount",
                    percentage,
                    discount,
                )
                .await?;
            }
        }

        self.update_amounts(invoice.id).await?;
        self.find_item(item_id).await
    }

    /// Blank line for manual invoicing, nothing priced yet.
    pub async fn item_add_empty(&self, invoice_id: Uuid) -> UseCaseResult<InvoiceItemEntity> {
        let invoice = self
            .invoice_repo
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        let line_number = self.next_line_number(invoice.id).await?;
        let item_id = self
            .invoice_repo
            .insert_item(InsertInvoiceItemEntity {
                invoice_id: invoice.id,
                subscription_id: None,
                subscription_year: None,
                subscription_month: None,
                classpass_id: None,
                membership_id: None,
                product_id: None,
                event_ticket_id: None,
                line_number,
                product_name: String::new(),
                description: String::new(),
                quantity: Decimal::ZERO,
                price: Decimal::ZERO,
                subtotal: Decimal::ZERO,
                tax: Decimal::ZERO,
                total: Decimal::ZERO,
                tax_rate_id: None,
                gl_account_id: None,
                cost_center_id: None,
            })
            .await?;

        self.find_item(item_id).await
    }

    /// Deletes an item, closes the gap in the line numbers and recomputes
    /// the amounts.
    pub async fn delete_item(&self, item_id: Uuid) -> UseCaseResult<()> {
        let item = self
            .invoice_repo
            .find_item_by_id(item_id)
            .await?
            .ok_or(InvoiceError::ItemNotFound)?;

        self.invoice_repo.delete_item(item.id).await?;

        let remaining = self.invoice_repo.items_for_invoice(item.invoice_id).await?;
        for (position, item) in remaining.iter().enumerate() {
            let line_number = position as i32;
            if item.line_number != line_number {
                self.invoice_repo
                    .set_item_line_number(item.id, line_number)
                    .await?;
            }
        }

        self.update_amounts(item.invoice_id).await?;

        info!(%item_id, invoice_id = %item.invoice_id, "invoices: deleted item");
        Ok(())
    }

    pub async fn record_payment(&self, payment: NewInvoicePayment) -> UseCaseResult<Uuid> {
        let invoice = self
            .invoice_repo
            .find_invoice_by_id(payment.invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        let payment_id = self
            .invoice_repo
            .insert_payment(InsertInvoicePaymentEntity {
                invoice_id: invoice.id,
                date: payment.date,
                amount: payment.amount,
                payment_method: payment.payment_method,
                note: payment.note,
            })
            .await?;

        info!(
            invoice_id = %invoice.id,
            %payment_id,
            amount = %payment.amount,
            "invoices: recorded payment"
        );

        self.update_amounts(invoice.id).await?;
        Ok(payment_id)
    }

    /// Re-aggregates every money field from the items and payments.
    /// Whenever the balance reaches zero or below the invoice flips to
    /// PAID, whatever state it was in.
    pub async fn update_amounts(&self, invoice_id: Uuid) -> UseCaseResult<InvoiceAmounts> {
        let invoice = self
            .invoice_repo
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        let items = self.invoice_repo.items_for_invoice(invoice_id).await?;
        let payments = self.invoice_repo.payments_for_invoice(invoice_id).await?;

        let subtotal: Decimal = items.iter().map(|item| item.subtotal).sum();
        let tax: Decimal = items.iter().map(|item| item.tax).sum();
        let total: Decimal = items.iter().map(|item| item.total).sum();
        let paid: Decimal = payments.iter().map(|payment| payment.amount).sum();
        let balance = total - paid;

        let status = if balance <= Decimal::ZERO {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::from_str(&invoice.status).ok_or_else(|| {
                InvoiceError::Internal(anyhow::anyhow!(
                    "invoice {} carries unknown status {}",
                    invoice.id,
                    invoice.status
                ))
            })?
        };

        let amounts = InvoiceAmounts {
            subtotal,
            tax,
            total,
            paid,
            balance,
        };
        self.invoice_repo
            .set_amounts_and_status(invoice_id, amounts, status)
            .await?;

        Ok(amounts)
    }

    pub async fn cancel(&self, invoice_id: Uuid) -> UseCaseResult<()> {
        self.invoice_repo
            .set_status(invoice_id, InvoiceStatus::Cancelled)
            .await?;
        info!(%invoice_id, "invoices: cancelled invoice");
        Ok(())
    }

    /// Cancels the invoice and books out its amounts on a new linked
    /// credit invoice: every line duplicated at the negated price, line
    /// numbers kept.
    pub async fn cancel_and_create_credit_invoice(
        &self,
        invoice_id: Uuid,
        today: NaiveDate,
    ) -> UseCaseResult<InvoiceEntity> {
        let original = self
            .invoice_repo
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        self.cancel(original.id).await?;

        let credit_invoice = self
            .create_invoice(
                NewInvoice {
                    account_id: original.account_id,
                    business_id: original.business_id,
                    invoice_group_id: original.invoice_group_id,
                    payment_method: original.payment_method.clone(),
                    summary: original.summary.clone(),
                    note: original.note.clone(),
                    status: InvoiceStatus::Sent,
                    date_sent: None,
                    credit_invoice_for: Some(original.id),
                },
                today,
            )
            .await?;

        let items = self.invoice_repo.items_for_invoice(original.id).await?;
        for item in items {
            let price = -item.price;
            let tax_rate = self.load_tax_rate(item.tax_rate_id).await?;
            let amounts = line_amounts(price, item.quantity, tax_rate.as_ref());

            self.invoice_repo
                .insert_item(InsertInvoiceItemEntity {
                    invoice_id: credit_invoice.id,
                    subscription_id: item.subscription_id,
                    subscription_year: item.subscription_year,
                    subscription_month: item.subscription_month,
                    classpass_id: item.classpass_id,
                    membership_id: item.membership_id,
                    product_id: item.product_id,
                    event_ticket_id: item.event_ticket_id,
                    line_number: item.line_number,
                    product_name: item.product_name.clone(),
                    description: item.description.clone(),
                    quantity: item.quantity,
                    price,
                    subtotal: amounts.subtotal,
                    tax: amounts.tax,
                    total: amounts.total,
                    tax_rate_id: item.tax_rate_id,
                    gl_account_id: item.gl_account_id,
                    cost_center_id: item.cost_center_id,
                })
                .await?;
        }

        self.update_amounts(credit_invoice.id).await?;

        info!(
            original_invoice_id = %original.id,
            credit_invoice_id = %credit_invoice.id,
            "invoices: cancelled invoice and created credit invoice"
        );

        self.invoice_repo
            .find_invoice_by_id(credit_invoice.id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)
    }

    /// The monthly billing step for one subscription. Returns the created
    /// item, or None when the month is already billed, not billable or
    /// priced at zero by an alt price.
    pub async fn create_subscription_invoice_for_month(
        &self,
        subscription_id: Uuid,
        year: i32,
        month: u32,
        description: Option<String>,
        invoice_date: InvoiceDate,
        today: NaiveDate,
    ) -> UseCaseResult<Option<InvoiceItemEntity>> {
        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await?
            .ok_or(InvoiceError::SubscriptionNotFound)?;

        if self
            .invoice_repo
            .subscription_item_exists(subscription.id, year, month)
            .await?
        {
            info!(
                %subscription_id,
                year,
                month,
                "invoices: subscription month already billed, skipping"
            );
            return Ok(None);
        }

        let alt_price = self
            .subscription_repo
            .alt_price_for_month(subscription.id, year, month)
            .await?;
        if let Some(alt) = &alt_price {
            if alt.amount == Decimal::ZERO {
                info!(
                    %subscription_id,
                    year,
                    month,
                    "invoices: alt price is zero, month not billed"
                );
                return Ok(None);
            }
        }

        let pauses = self.subscription_repo.pauses_for(subscription.id).await?;
        let pause_intervals: Vec<DateInterval> =
            pauses.iter().map(|pause| pause.interval()).collect();
        let period = billing_periods::billable_period(
            subscription.date_start,
            subscription.date_end,
            &pause_intervals,
            year,
            month,
        );
        let billable_days = period.map(|period| period.billable_days).unwrap_or(0);
        if billable_days == 0 && alt_price.is_none() {
            return Ok(None);
        }

        let (first_day, _) = billing_periods::month_bounds(year, month)
            .ok_or_else(|| InvoiceError::Internal(anyhow::anyhow!("invalid month {year}-{month}")))?;
        let date_sent = match invoice_date {
            InvoiceDate::Today => today,
            InvoiceDate::FirstOfMonth => first_day,
        };

        let invoice = self
            .create_invoice(
                NewInvoice {
                    account_id: subscription.account_id,
                    business_id: None,
                    invoice_group_id: self.subscription_invoice_group_id,
                    payment_method: Some(subscription.payment_method.clone()),
                    summary: format!("Subscription invoice {year}-{month:02}"),
                    note: String::new(),
                    status: InvoiceStatus::Sent,
                    date_sent: Some(date_sent),
                    credit_invoice_for: None,
                },
                today,
            )
            .await?;

        let item = self
            .item_add_subscription(invoice.id, subscription.id, year, month, description)
            .await?;

        Ok(Some(item))
    }

    /// Daily sweep: SENT invoices past their due date become OVERDUE.
    pub async fn mark_overdue(&self, today: NaiveDate) -> UseCaseResult<u64> {
        let marked = self.invoice_repo.mark_overdue(today).await?;
        info!(marked, "invoices: marked invoices overdue");
        Ok(marked)
    }

    /// OVERDUE invoices whose last reminder is at least a day old, or that
    /// never had one.
    pub async fn reminder_eligible(&self, today: NaiveDate) -> UseCaseResult<i64> {
        let eligible = self.invoice_repo.count_reminder_eligible(today).await?;
        info!(eligible, "invoices: invoices eligible for a reminder");
        Ok(eligible)
    }

    /// Sends the reminder mail, best effort, and stamps the reminder date.
    pub async fn send_reminder(&self, invoice_id: Uuid, today: NaiveDate) -> UseCaseResult<()> {
        let invoice = self
            .invoice_repo
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        self.notify(
            MailTemplate::InvoiceReminder,
            json!({
                "invoice_id": invoice.id,
                "invoice_number": invoice.invoice_number,
                "account_id": invoice.account_id,
                "balance": invoice.balance,
                "date_due": invoice.date_due,
            }),
        )
        .await;

        self.invoice_repo.set_last_reminder(invoice.id, today).await?;
        info!(%invoice_id, "invoices: reminder recorded");
        Ok(())
    }

    async fn add_discount_item(
        &self,
        invoice: &InvoiceEntity,
        ticket: &crate::domain::entities::catalog::EventTicketEntity,
        tax_rate: Option<&TaxRateEntity>,
        product_name: &str,
        percentage: Decimal,
        discount: Decimal,
    ) -> UseCaseResult<()> {
        let price = -discount;
        let amounts = line_amounts(price, Decimal::ONE, tax_rate);
        let line_number = self.next_line_number(invoice.id).await?;

        self.invoice_repo
            .insert_item(InsertInvoiceItemEntity {
                invoice_id: invoice.id,
                subscription_id: None,
                subscription_year: None,
                subscription_month: None,
                classpass_id: None,
                membership_id: None,
                product_id: None,
                event_ticket_id: None,
                line_number,
                product_name: product_name.to_string(),
                description: format!("{percentage}% discount"),
                quantity: Decimal::ONE,
                price,
                subtotal: amounts.subtotal,
                tax: amounts.tax,
                total: amounts.total,
                tax_rate_id: ticket.tax_rate_id,
                gl_account_id: ticket.gl_account_id,
                cost_center_id: ticket.cost_center_id,
            })
            .await?;

        info!(
            invoice_id = %invoice.id,
            product_name,
            %discount,
            "invoices: added discount item"
        );
        Ok(())
    }

    /// Highest discount the account earns through the subscription groups
    /// of its subscriptions valid today.
    async fn highest_subscription_group_discount(
        &self,
        account_id: Uuid,
        ticket_id: Uuid,
        today: NaiveDate,
    ) -> UseCaseResult<Option<Decimal>> {
        let discounts = self.catalog_repo.ticket_group_discounts(ticket_id).await?;
        if discounts.is_empty() {
            return Ok(None);
        }

        let subscriptions = self.subscription_repo.list_for_account(account_id).await?;
        let mut group_ids = Vec::new();
        for subscription in subscriptions {
            if !subscription.valid_on(today) {
                continue;
            }
            let groups = self
                .schedule_repo
                .subscription_groups_for_plan(subscription.subscription_plan_id)
                .await?;
            group_ids.extend(groups);
        }

        Ok(discounts
            .iter()
            .filter(|discount| group_ids.contains(&discount.subscription_group_id))
            .map(|discount| discount.discount_percentage)
            .max())
    }

    async fn load_tax_rate(&self, tax_rate_id: Option<Uuid>) -> UseCaseResult<Option<TaxRateEntity>> {
        match tax_rate_id {
            Some(id) => Ok(self.catalog_repo.find_tax_rate(id).await?),
            None => Ok(None),
        }
    }

    /// Line numbers are the item count so far: contiguous from zero.
    async fn next_line_number(&self, invoice_id: Uuid) -> UseCaseResult<i32> {
        let items = self.invoice_repo.items_for_invoice(invoice_id).await?;
        Ok(items.len() as i32)
    }

    async fn find_item(&self, item_id: Uuid) -> UseCaseResult<InvoiceItemEntity> {
        self.invoice_repo
            .find_item_by_id(item_id)
            .await?
            .ok_or(InvoiceError::ItemNotFound)
    }

    async fn notify(&self, template: MailTemplate, context: serde_json::Value) {
        if let Err(err) = self.notifier.send(template, context).await {
            warn!(template = %template, error = ?err, "invoices: notification failed to send");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::usecases::notifications::MockNotifier;
    use crate::domain::entities::accounts::{AccountEntity, BusinessEntity};
    use crate::domain::entities::catalog::{
        EventEarlybirdEntity, EventTicketEntity, EventTicketGroupDiscountEntity,
        ScheduleEventEntity, SubscriptionPlanEntity, SubscriptionPlanPriceEntity,
    };
    use crate::domain::entities::invoice_items::InvoicePaymentEntity;
    use crate::domain::entities::invoices::InvoiceGroupEntity;
    use crate::domain::entities::subscriptions::SubscriptionEntity;
    use crate::domain::repositories::accounts::MockAccountRepository;
    use crate::domain::repositories::catalog::MockCatalogRepository;
    use crate::domain::repositories::classpasses::MockClasspassRepository;
    use crate::domain::repositories::invoices::MockInvoiceRepository;
    use crate::domain::repositories::schedule::MockScheduleRepository;
    use crate::domain::repositories::subscriptions::MockSubscriptionRepository;
    use crate::domain::value_objects::enums::payment_methods::PaymentMethod;

    type TestUseCase = InvoiceUseCase<
        MockAccountRepository,
        MockSubscriptionRepository,
        MockClasspassRepository,
        MockInvoiceRepository,
        MockCatalogRepository,
        MockScheduleRepository,
        MockNotifier,
    >;

    struct Mocks {
        account_repo: MockAccountRepository,
        subscription_repo: MockSubscriptionRepository,
        classpass_repo: MockClasspassRepository,
        invoice_repo: MockInvoiceRepository,
        catalog_repo: MockCatalogRepository,
        schedule_repo: MockScheduleRepository,
        notifier: MockNotifier,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                account_repo: MockAccountRepository::new(),
                subscription_repo: MockSubscriptionRepository::new(),
                classpass_repo: MockClasspassRepository::new(),
                invoice_repo: MockInvoiceRepository::new(),
                catalog_repo: MockCatalogRepository::new(),
                schedule_repo: MockScheduleRepository::new(),
                notifier: MockNotifier::new(),
            }
        }

        fn into_usecase(self, subscription_invoice_group_id: Uuid) -> TestUseCase {
            InvoiceUseCase::new(
                Arc::new(self.account_repo),
                Arc::new(self.subscription_repo),
                Arc::new(self.classpass_repo),
                Arc::new(self.invoice_repo),
                Arc::new(self.catalog_repo),
                Arc::new(self.schedule_repo),
                Arc::new(self.notifier),
                subscription_invoice_group_id,
            )
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn sample_account(id: Uuid) -> AccountEntity {
        AccountEntity {
            id,
            full_name: "Anna de Vries".to_string(),
            email: "anna@example.com".to_string(),
            address: "Kerkstraat 1".to_string(),
            postcode: "1017 GA".to_string(),
            city: "Amsterdam".to_string(),
            country: "NL".to_string(),
            invoice_to_business: None,
            mollie_customer_id: None,
            created_at: Utc::now(),
        }
    }

    fn sample_group(id: Uuid, due_after_days: i32) -> InvoiceGroupEntity {
        InvoiceGroupEntity {
            id,
            name: "Default".to_string(),
            next_id: 1,
            numbering_year: 0,
            due_after_days,
            prefix: "INV".to_string(),
            prefix_year: true,
            auto_reset_prefix_year: true,
            terms: "Payment within the term".to_string(),
            footer: "Thank you".to_string(),
        }
    }

    fn sample_invoice(id: Uuid, account_id: Uuid, group_id: Uuid) -> InvoiceEntity {
        InvoiceEntity {
            id,
            account_id,
            business_id: None,
            invoice_group_id: group_id,
            invoice_number: "INV20261".to_string(),
            status: InvoiceStatus::Sent.to_string(),
            payment_method: None,
            relation_company: String::new(),
            relation_company_registration: String::new(),
            relation_company_tax_registration: String::new(),
            relation_contact_name: "Anna de Vries".to_string(),
            relation_address: "Kerkstraat 1".to_string(),
            relation_postcode: "1017 GA".to_string(),
            relation_city: "Amsterdam".to_string(),
            relation_country: "NL".to_string(),
            summary: String::new(),
            note: String::new(),
            terms: String::new(),
            footer: String::new(),
            date_sent: date(2026, 4, 1),
            date_due: date(2026, 4, 15),
            date_last_reminder: None,
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            paid: Decimal::ZERO,
            balance: Decimal::ZERO,
            credit_invoice_for: None,
            created_at: Utc::now(),
        }
    }

    fn sample_item(id: Uuid, invoice_id: Uuid, line_number: i32, price: Decimal) -> InvoiceItemEntity {
        InvoiceItemEntity {
            id,
            invoice_id,
            subscription_id: None,
            subscription_year: None,
            subscription_month: None,
            classpass_id: None,
            membership_id: None,
            product_id: None,
            event_ticket_id: None,
            line_number,
            product_name: "Item".to_string(),
            description: String::new(),
            quantity: Decimal::ONE,
            price,
            subtotal: price,
            tax: Decimal::ZERO,
            total: price,
            tax_rate_id: None,
            gl_account_id: None,
            cost_center_id: None,
        }
    }

    fn sample_subscription(id: Uuid, account_id: Uuid, plan_id: Uuid, start: NaiveDate) -> SubscriptionEntity {
        SubscriptionEntity {
            id,
            account_id,
            subscription_plan_id: plan_id,
            date_start: start,
            date_end: None,
            payment_method: PaymentMethod::Mollie.to_string(),
            registration_fee_paid: false,
            note: String::new(),
            created_at: Utc::now(),
        }
    }

    fn sample_plan(id: Uuid, registration_fee: Decimal) -> SubscriptionPlanEntity {
        SubscriptionPlanEntity {
            id,
            name: "Gold".to_string(),
            classes: 8,
            unlimited: false,
            registration_fee,
            tax_rate_id: None,
            gl_account_id: None,
            cost_center_id: None,
        }
    }

    #[tokio::test]
    async fn create_invoice_snapshots_account_and_reserves_number() {
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let invoice_id = Uuid::new_v4();
        let today = date(2026, 4, 1);

        let mut mocks = Mocks::new();

        mocks
            .account_repo
            .expect_find_by_id()
            .with(eq(account_id))
            .returning(move |id| Box::pin(async move { Ok(Some(sample_account(id))) }));
        mocks
            .invoice_repo
            .expect_find_group_by_id()
            .with(eq(group_id))
            .returning(move |id| Box::pin(async move { Ok(Some(sample_group(id, 14))) }));
        mocks
            .invoice_repo
            .expect_reserve_invoice_number()
            .with(eq(group_id), eq(today))
            .returning(|_, _| Box::pin(async { Ok("INV20261".to_string()) }));
        mocks
            .invoice_repo
            .expect_insert_invoice()
            .returning(move |invoice| {
                assert_eq!(invoice.invoice_number, "INV20261");
                assert_eq!(invoice.relation_contact_name, "Anna de Vries");
                assert_eq!(invoice.relation_company, "");
                assert_eq!(invoice.date_sent, date(2026, 4, 1));
                assert_eq!(invoice.date_due, date(2026, 4, 15));
                assert_eq!(invoice.terms, "Payment within the term");
                Box::pin(async move { Ok(invoice_id) })
            });
        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .with(eq(invoice_id))
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_invoice(id, account_id, group_id))) })
            });
        mocks
            .notifier
            .expect_send()
            .times(1)
            .withf(|template, _| *template == MailTemplate::InvoiceNotification)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let usecase = mocks.into_usecase(group_id);

        let invoice = usecase
            .create_invoice(
                NewInvoice {
                    account_id,
                    business_id: None,
                    invoice_group_id: group_id,
                    payment_method: None,
                    summary: "Test".to_string(),
                    note: String::new(),
                    status: InvoiceStatus::Sent,
                    date_sent: None,
                    credit_invoice_for: None,
                },
                today,
            )
            .await
            .unwrap();

        assert_eq!(invoice.invoice_number, "INV20261");
    }

    #[tokio::test]
    async fn create_invoice_links_the_accounts_default_business() {
        let account_id = Uuid::new_v4();
        let business_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let invoice_id = Uuid::new_v4();
        let today = date(2026, 4, 1);

        let mut mocks = Mocks::new();

        mocks.account_repo.expect_find_by_id().returning(move |id| {
            Box::pin(async move {
                let mut account = sample_account(id);
                account.invoice_to_business = Some(business_id);
                Ok(Some(account))
            })
        });
        mocks
            .account_repo
            .expect_find_business_by_id()
            .with(eq(business_id))
            .returning(|id| {
                Box::pin(async move {
                    Ok(Some(BusinessEntity {
                        id,
                        name: "Yoga Works BV".to_string(),
                        registration: "KVK 123".to_string(),
                        tax_registration: "NL001".to_string(),
                        address: "Herengracht 2".to_string(),
                        postcode: "1015 BK".to_string(),
                        city: "Amsterdam".to_string(),
                        country: "NL".to_string(),
                    }))
                })
            });
        mocks
            .invoice_repo
            .expect_find_group_by_id()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_group(id, 30))) }));
        mocks
            .invoice_repo
            .expect_reserve_invoice_number()
            .returning(|_, _| Box::pin(async { Ok("INV20262".to_string()) }));
        mocks
            .invoice_repo
            .expect_insert_invoice()
            .returning(move |invoice| {
                assert_eq!(invoice.business_id, Some(business_id));
                assert_eq!(invoice.relation_company, "Yoga Works BV");
                assert_eq!(invoice.relation_contact_name, "");
                assert_eq!(invoice.relation_address, "Herengracht 2");
                Box::pin(async move { Ok(invoice_id) })
            });
        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_invoice(id, account_id, group_id))) })
            });

        let usecase = mocks.into_usecase(group_id);

        usecase
            .create_invoice(
                NewInvoice {
                    account_id,
                    business_id: None,
                    invoice_group_id: group_id,
                    payment_method: None,
                    summary: String::new(),
                    note: String::new(),
                    status: InvoiceStatus::Draft,
                    date_sent: Some(today),
                    credit_invoice_for: None,
                },
                today,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn subscription_item_prorates_a_mid_month_start() {
        let invoice_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let item_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_invoice(id, account_id, group_id))) })
            });
        mocks
            .subscription_repo
            .expect_find_by_id()
            .with(eq(subscription_id))
            .returning(move |id| {
                Box::pin(async move {
                    // Starts on the 11th of a 30 day month: 20 billable days.
                    Ok(Some(sample_subscription(
                        id,
                        account_id,
                        plan_id,
                        date(2026, 4, 11),
                    )))
                })
            });
        mocks
            .catalog_repo
            .expect_find_subscription_plan()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_plan(id, Decimal::ZERO))) }));
        mocks
            .subscription_repo
            .expect_pauses_for()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .subscription_repo
            .expect_alt_price_for_month()
            .returning(|_, _, _| Box::pin(async { Ok(None) }));
        mocks
            .catalog_repo
            .expect_subscription_plan_price_on()
            .with(eq(plan_id), eq(date(2026, 4, 1)))
            .returning(|plan_id, _| {
                Box::pin(async move {
                    Ok(Some(SubscriptionPlanPriceEntity {
                        id: Uuid::new_v4(),
                        subscription_plan_id: plan_id,
                        price: dec!(90.00),
                        date_start: date(2026, 1, 1),
                        date_end: None,
                    }))
                })
            });
        mocks
            .invoice_repo
            .expect_items_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_insert_item()
            .times(1)
            .returning(move |item| {
                assert_eq!(item.price, dec!(60.00));
                assert_eq!(item.subtotal, dec!(60.00));
                assert_eq!(item.line_number, 0);
                assert_eq!(item.subscription_year, Some(2026));
                assert_eq!(item.subscription_month, Some(4));
                assert!(item.product_name.starts_with("Subscription "));
                assert_eq!(item.description, "Gold [2026-04-11 - 2026-04-30]");
                Box::pin(async move { Ok(item_id) })
            });
        mocks
            .invoice_repo
            .expect_payments_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_set_amounts_and_status()
            .returning(|_, _, _| Box::pin(async { Ok(()) }));
        mocks
            .invoice_repo
            .expect_find_item_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_item(id, invoice_id, 0, dec!(60.00)))) })
            });

        let usecase = mocks.into_usecase(group_id);

        let item = usecase
            .item_add_subscription(invoice_id, subscription_id, 2026, 4, None)
            .await
            .unwrap();

        assert_eq!(item.price, dec!(60.00));
    }

    #[tokio::test]
    async fn subscription_item_adds_registration_fee_once() {
        let invoice_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let item_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_invoice(id, account_id, group_id))) })
            });
        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_subscription(
                        id,
                        account_id,
                        plan_id,
                        date(2026, 4, 1),
                    )))
                })
            });
        mocks
            .catalog_repo
            .expect_find_subscription_plan()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_plan(id, dec!(25.00)))) }));
        mocks
            .subscription_repo
            .expect_pauses_for()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .subscription_repo
            .expect_alt_price_for_month()
            .returning(|_, _, _| Box::pin(async { Ok(None) }));
        mocks
            .catalog_repo
            .expect_subscription_plan_price_on()
            .returning(|plan_id, _| {
                Box::pin(async move {
                    Ok(Some(SubscriptionPlanPriceEntity {
                        id: Uuid::new_v4(),
                        subscription_plan_id: plan_id,
                        price: dec!(90.00),
                        date_start: date(2026, 1, 1),
                        date_end: None,
                    }))
                })
            });
        mocks
            .subscription_repo
            .expect_account_has_paid_registration_fee()
            .with(eq(account_id))
            .returning(|_| Box::pin(async { Ok(false) }));
        mocks
            .subscription_repo
            .expect_mark_registration_fee_paid()
            .with(eq(subscription_id))
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));
        mocks
            .invoice_repo
            .expect_items_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_insert_item()
            .times(2)
            .returning(move |item| {
                if item.product_name == "Registration fee" {
                    assert_eq!(item.description, "One time registration fee");
                    assert_eq!(item.price, dec!(25.00));
                    assert_eq!(item.gl_account_id, None);
                } else {
                    assert_eq!(item.price, dec!(90.00));
                }
                Box::pin(async move { Ok(item_id) })
            });
        mocks
            .invoice_repo
            .expect_payments_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_set_amounts_and_status()
            .returning(|_, _, _| Box::pin(async { Ok(()) }));
        mocks
            .invoice_repo
            .expect_find_item_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_item(id, invoice_id, 0, dec!(90.00)))) })
            });

        let usecase = mocks.into_usecase(group_id);

        usecase
            .item_add_subscription(invoice_id, subscription_id, 2026, 4, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn subscription_item_honors_the_alt_price() {
        let invoice_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let item_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_invoice(id, account_id, group_id))) })
            });
        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_subscription(
                        id,
                        account_id,
                        plan_id,
                        date(2026, 4, 11),
                    )))
                })
            });
        mocks
            .catalog_repo
            .expect_find_subscription_plan()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_plan(id, Decimal::ZERO))) }));
        mocks
            .subscription_repo
            .expect_pauses_for()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .subscription_repo
            .expect_alt_price_for_month()
            .returning(move |subscription_id, _, _| {
                Box::pin(async move {
                    Ok(Some(
                        crate::domain::entities::subscriptions::SubscriptionAltPriceEntity {
                            id: Uuid::new_v4(),
                            subscription_id,
                            subscription_year: 2026,
                            subscription_month: 4,
                            amount: dec!(75.00),
                            description: "Agreed fixed fee".to_string(),
                        },
                    ))
                })
            });
        mocks.catalog_repo.expect_subscription_plan_price_on().never();
        mocks
            .invoice_repo
            .expect_items_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_insert_item()
            .times(1)
            .returning(move |item| {
                assert_eq!(item.price, dec!(75.00));
                assert_eq!(item.description, "Agreed fixed fee");
                Box::pin(async move { Ok(item_id) })
            });
        mocks
            .invoice_repo
            .expect_payments_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_set_amounts_and_status()
            .returning(|_, _, _| Box::pin(async { Ok(()) }));
        mocks
            .invoice_repo
            .expect_find_item_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_item(id, invoice_id, 0, dec!(75.00)))) })
            });

        let usecase = mocks.into_usecase(group_id);

        usecase
            .item_add_subscription(invoice_id, subscription_id, 2026, 4, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn monthly_billing_is_idempotent_per_subscription_month() {
        let subscription_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_subscription(
                        id,
                        account_id,
                        plan_id,
                        date(2026, 1, 1),
                    )))
                })
            });
        mocks
            .invoice_repo
            .expect_subscription_item_exists()
            .with(eq(subscription_id), eq(2026), eq(4))
            .returning(|_, _, _| Box::pin(async { Ok(true) }));
        mocks.invoice_repo.expect_insert_invoice().never();

        let usecase = mocks.into_usecase(group_id);

        let result = usecase
            .create_subscription_invoice_for_month(
                subscription_id,
                2026,
                4,
                None,
                InvoiceDate::Today,
                date(2026, 4, 1),
            )
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn monthly_billing_skips_months_without_billable_days() {
        let subscription_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    // Starts after the billed month ends.
                    Ok(Some(sample_subscription(
                        id,
                        account_id,
                        plan_id,
                        date(2026, 5, 1),
                    )))
                })
            });
        mocks
            .invoice_repo
            .expect_subscription_item_exists()
            .returning(|_, _, _| Box::pin(async { Ok(false) }));
        mocks
            .subscription_repo
            .expect_alt_price_for_month()
            .returning(|_, _, _| Box::pin(async { Ok(None) }));
        mocks
            .subscription_repo
            .expect_pauses_for()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks.invoice_repo.expect_insert_invoice().never();

        let usecase = mocks.into_usecase(group_id);

        let result = usecase
            .create_subscription_invoice_for_month(
                subscription_id,
                2026,
                4,
                None,
                InvoiceDate::Today,
                date(2026, 4, 1),
            )
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn monthly_billing_creates_a_sent_invoice_dated_first_of_month() {
        let subscription_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let invoice_id = Uuid::new_v4();
        let item_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_subscription(
                        id,
                        account_id,
                        plan_id,
                        date(2026, 1, 1),
                    )))
                })
            });
        mocks
            .invoice_repo
            .expect_subscription_item_exists()
            .returning(|_, _, _| Box::pin(async { Ok(false) }));
        mocks
            .subscription_repo
            .expect_alt_price_for_month()
            .returning(|_, _, _| Box::pin(async { Ok(None) }));
        mocks
            .subscription_repo
            .expect_pauses_for()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .account_repo
            .expect_find_by_id()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_account(id))) }));
        mocks
            .invoice_repo
            .expect_find_group_by_id()
            .with(eq(group_id))
            .returning(move |id| Box::pin(async move { Ok(Some(sample_group(id, 14))) }));
        mocks
            .invoice_repo
            .expect_reserve_invoice_number()
            .with(eq(group_id), eq(date(2026, 4, 1)))
            .returning(|_, _| Box::pin(async { Ok("INV20267".to_string()) }));
        mocks
            .invoice_repo
            .expect_insert_invoice()
            .times(1)
            .returning(move |invoice| {
                assert_eq!(invoice.status, "SENT");
                assert_eq!(invoice.summary, "Subscription invoice 2026-04");
                assert_eq!(invoice.payment_method.as_deref(), Some("MOLLIE"));
                assert_eq!(invoice.date_sent, date(2026, 4, 1));
                Box::pin(async move { Ok(invoice_id) })
            });
        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_invoice(id, account_id, group_id))) })
            });
        mocks
            .notifier
            .expect_send()
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .catalog_repo
            .expect_find_subscription_plan()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_plan(id, Decimal::ZERO))) }));
        mocks
            .catalog_repo
            .expect_subscription_plan_price_on()
            .returning(|plan_id, _| {
                Box::pin(async move {
                    Ok(Some(SubscriptionPlanPriceEntity {
                        id: Uuid::new_v4(),
                        subscription_plan_id: plan_id,
                        price: dec!(90.00),
                        date_start: date(2026, 1, 1),
                        date_end: None,
                    }))
                })
            });
        mocks
            .invoice_repo
            .expect_items_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_insert_item()
            .times(1)
            .returning(move |item| {
                assert_eq!(item.price, dec!(90.00));
                Box::pin(async move { Ok(item_id) })
            });
        mocks
            .invoice_repo
            .expect_payments_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_set_amounts_and_status()
            .returning(|_, _, _| Box::pin(async { Ok(()) }));
        mocks
            .invoice_repo
            .expect_find_item_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_item(id, invoice_id, 0, dec!(90.00)))) })
            });

        let usecase = mocks.into_usecase(group_id);

        let item = usecase
            .create_subscription_invoice_for_month(
                subscription_id,
                2026,
                4,
                None,
                InvoiceDate::FirstOfMonth,
                date(2026, 4, 20),
            )
            .await
            .unwrap();

        assert!(item.is_some());
    }

    #[tokio::test]
    async fn deleting_an_item_resequences_line_numbers() {
        let invoice_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let deleted_id = Uuid::new_v4();
        let first_id = Uuid::new_v4();
        let gap_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        mocks
            .invoice_repo
            .expect_find_item_by_id()
            .with(eq(deleted_id))
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_item(id, invoice_id, 1, dec!(10.00)))) })
            });
        mocks
            .invoice_repo
            .expect_delete_item()
            .with(eq(deleted_id))
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));
        mocks
            .invoice_repo
            .expect_items_for_invoice()
            .returning(move |_| {
                Box::pin(async move {
                    Ok(vec![
                        sample_item(first_id, invoice_id, 0, dec!(10.00)),
                        sample_item(gap_id, invoice_id, 2, dec!(20.00)),
                    ])
                })
            });
        mocks
            .invoice_repo
            .expect_set_item_line_number()
            .with(eq(gap_id), eq(1))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_invoice(id, account_id, group_id))) })
            });
        mocks
            .invoice_repo
            .expect_payments_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_set_amounts_and_status()
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let usecase = mocks.into_usecase(group_id);

        usecase.delete_item(deleted_id).await.unwrap();
    }

    #[tokio::test]
    async fn update_amounts_flips_to_paid_when_balance_reaches_zero() {
        let invoice_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_invoice(id, account_id, group_id))) })
            });
        mocks
            .invoice_repo
            .expect_items_for_invoice()
            .returning(move |_| {
                Box::pin(async move {
                    Ok(vec![sample_item(
                        Uuid::new_v4(),
                        invoice_id,
                        0,
                        dec!(100.00),
                    )])
                })
            });
        mocks
            .invoice_repo
            .expect_payments_for_invoice()
            .returning(move |_| {
                Box::pin(async move {
                    Ok(vec![InvoicePaymentEntity {
                        id: Uuid::new_v4(),
                        invoice_id,
                        date: date(2026, 4, 10),
                        amount: dec!(100.00),
                        payment_method: None,
                        note: String::new(),
                    }])
                })
            });
        mocks
            .invoice_repo
            .expect_set_amounts_and_status()
            .withf(|_, amounts, status| {
                amounts.balance == Decimal::ZERO
                    && amounts.paid == dec!(100.00)
                    && *status == InvoiceStatus::Paid
            })
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let usecase = mocks.into_usecase(group_id);

        let amounts = usecase.update_amounts(invoice_id).await.unwrap();

        assert_eq!(amounts.total, dec!(100.00));
        assert_eq!(amounts.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn credit_invoice_negates_every_line_of_the_original() {
        let original_id = Uuid::new_v4();
        let credit_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    let mut invoice = sample_invoice(id, account_id, group_id);
                    if id == credit_id {
                        invoice.credit_invoice_for = Some(original_id);
                    }
                    Ok(Some(invoice))
                })
            });
        mocks
            .invoice_repo
            .expect_set_status()
            .with(eq(original_id), eq(InvoiceStatus::Cancelled))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .account_repo
            .expect_find_by_id()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_account(id))) }));
        mocks
            .invoice_repo
            .expect_find_group_by_id()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_group(id, 14))) }));
        mocks
            .invoice_repo
            .expect_reserve_invoice_number()
            .returning(|_, _| Box::pin(async { Ok("INV20263".to_string()) }));
        mocks
            .invoice_repo
            .expect_insert_invoice()
            .returning(move |invoice| {
                assert_eq!(invoice.credit_invoice_for, Some(original_id));
                Box::pin(async move { Ok(credit_id) })
            });
        mocks
            .notifier
            .expect_send()
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .invoice_repo
            .expect_items_for_invoice()
            .returning(move |invoice_id| {
                Box::pin(async move {
                    if invoice_id == original_id {
                        Ok(vec![
                            sample_item(Uuid::new_v4(), original_id, 0, dec!(60.00)),
                            sample_item(Uuid::new_v4(), original_id, 1, dec!(25.00)),
                        ])
                    } else {
                        Ok(vec![])
                    }
                })
            });
        mocks
            .invoice_repo
            .expect_insert_item()
            .times(2)
            .returning(|item| {
                assert!(item.price < Decimal::ZERO);
                assert!(item.total < Decimal::ZERO);
                Box::pin(async { Ok(Uuid::new_v4()) })
            });
        mocks
            .invoice_repo
            .expect_payments_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_set_amounts_and_status()
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let usecase = mocks.into_usecase(group_id);

        let credit = usecase
            .cancel_and_create_credit_invoice(original_id, date(2026, 4, 20))
            .await
            .unwrap();

        assert_eq!(credit.credit_invoice_for, Some(original_id));
    }

    #[tokio::test]
    async fn event_ticket_gets_earlybird_and_group_discount_lines() {
        let invoice_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let ticket_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let subscription_group_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let item_id = Uuid::new_v4();
        let today = date(2026, 4, 20);

        let mut mocks = Mocks::new();

        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_invoice(id, account_id, group_id))) })
            });
        mocks
            .catalog_repo
            .expect_find_event_ticket()
            .with(eq(ticket_id))
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(EventTicketEntity {
                        id,
                        schedule_event_id: event_id,
                        name: "Full weekend".to_string(),
                        price: dec!(50.00),
                        tax_rate_id: None,
                        gl_account_id: None,
                        cost_center_id: None,
                    }))
                })
            });
        mocks
            .catalog_repo
            .expect_find_schedule_event()
            .with(eq(event_id))
            .returning(|id| {
                Box::pin(async move {
                    Ok(Some(ScheduleEventEntity {
                        id,
                        name: "Summer retreat".to_string(),
                    }))
                })
            });
        mocks
            .catalog_repo
            .expect_earlybirds_on_date()
            .with(eq(event_id), eq(today))
            .returning(move |schedule_event_id, _| {
                Box::pin(async move {
                    Ok(vec![EventEarlybirdEntity {
                        id: Uuid::new_v4(),
                        schedule_event_id,
                        date_start: date(2026, 4, 1),
                        date_end: date(2026, 4, 30),
                        discount_percentage: dec!(10),
                    }])
                })
            });
        mocks
            .catalog_repo
            .expect_ticket_group_discounts()
            .with(eq(ticket_id))
            .returning(move |event_ticket_id| {
                Box::pin(async move {
                    Ok(vec![EventTicketGroupDiscountEntity {
                        id: Uuid::new_v4(),
                        event_ticket_id,
                        subscription_group_id,
                        discount_percentage: dec!(20),
                    }])
                })
            });
        mocks
            .subscription_repo
            .expect_list_for_account()
            .with(eq(account_id))
            .returning(move |account_id| {
                Box::pin(async move {
                    Ok(vec![sample_subscription(
                        Uuid::new_v4(),
                        account_id,
                        plan_id,
                        date(2026, 1, 1),
                    )])
                })
            });
        mocks
            .schedule_repo
            .expect_subscription_groups_for_plan()
            .with(eq(plan_id))
            .returning(move |_| {
                let group = subscription_group_id;
                Box::pin(async move { Ok(vec![group]) })
            });
        mocks
            .invoice_repo
            .expect_items_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_insert_item()
            .times(3)
            .returning(move |item| {
                match item.product_name.as_str() {
                    "Event ticket" => {
                        assert_eq!(item.price, dec!(50.00));
                        assert_eq!(item.description, "Summer retreat\n[Full weekend]");
                    }
                    "Event ticket earlybird discount" => {
                        assert_eq!(item.price, dec!(-5.00));
                        assert_eq!(item.description, "10% discount");
                    }
                    "Event ticket subscription discount" => {
                        assert_eq!(item.price, dec!(-10.00));
                        assert_eq!(item.description, "20% discount");
                    }
                    other => panic!("unexpected item {other}"),
                }
                Box::pin(async move { Ok(item_id) })
            });
        mocks
            .invoice_repo
            .expect_payments_for_invoice()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .invoice_repo
            .expect_set_amounts_and_status()
            .returning(|_, _, _| Box::pin(async { Ok(()) }));
        mocks
            .invoice_repo
            .expect_find_item_by_id()
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_item(id, invoice_id, 0, dec!(50.00)))) })
            });

        let usecase = mocks.into_usecase(group_id);

        usecase
            .item_add_event_ticket(invoice_id, ticket_id, today)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn overdue_sweep_reports_how_many_invoices_flipped() {
        let group_id = Uuid::new_v4();

        let mut mocks = Mocks::new();
        mocks
            .invoice_repo
            .expect_mark_overdue()
            .with(eq(date(2026, 4, 20)))
            .returning(|_| Box::pin(async { Ok(3) }));

        let usecase = mocks.into_usecase(group_id);

        let marked = usecase.mark_overdue(date(2026, 4, 20)).await.unwrap();

        assert_eq!(marked, 3);
    }
}
