use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::usecases::invoices::{InvoiceError, InvoiceUseCase};
use crate::application::usecases::notifications::Notifier;
use crate::domain::entities::accounts::AccountEntity;
use crate::domain::entities::invoices::InvoiceEntity;
use crate::domain::entities::payment_logs::InsertMolliePaymentLogEntity;
use crate::domain::entities::subscriptions::SubscriptionEntity;
use crate::domain::repositories::accounts::AccountRepository;
use crate::domain::repositories::catalog::CatalogRepository;
use crate::domain::repositories::classpasses::ClasspassRepository;
use crate::domain::repositories::invoices::InvoiceRepository;
use crate::domain::repositories::schedule::ScheduleRepository;
use crate::domain::repositories::subscriptions::SubscriptionRepository;
use crate::domain::value_objects::enums::invoice_dates::InvoiceDate;
use crate::domain::value_objects::enums::invoice_statuses::InvoiceStatus;
use crate::domain::value_objects::enums::mail_templates::MailTemplate;
use crate::domain::value_objects::enums::payment_methods::PaymentMethod;
use crate::domain::value_objects::enums::sequence_types::SequenceType;
use crate::infrastructure::mollie::client::{
    CreatePaymentRequest, MollieAmount, MollieClient, MollieCustomer, MollieMandate, MolliePayment,
};

/// Marker stored with every payment log row written by the collection run.
const COLLECTION_LOG_SOURCE: &str = "SUBSCRIPTION_COLLECTION";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MollieGateway: Send + Sync {
    async fn get_customer(&self, customer_id: &str) -> AnyResult<Option<MollieCustomer>>;

    async fn create_customer(&self, name: &str, email: &str) -> AnyResult<MollieCustomer>;

    async fn list_mandates(&self, customer_id: &str) -> AnyResult<Vec<MollieMandate>>;

    async fn create_payment(&self, request: CreatePaymentRequest) -> AnyResult<MolliePayment>;
}

#[async_trait]
impl MollieGateway for MollieClient {
    async fn get_customer(&self, customer_id: &str) -> AnyResult<Option<MollieCustomer>> {
        self.get_customer(customer_id).await
    }

    async fn create_customer(&self, name: &str, email: &str) -> AnyResult<MollieCustomer> {
        self.create_customer(name, email).await
    }

    async fn list_mandates(&self, customer_id: &str) -> AnyResult<Vec<MollieMandate>> {
        self.list_mandates(customer_id).await
    }

    async fn create_payment(&self, request: CreatePaymentRequest) -> AnyResult<MolliePayment> {
        self.create_payment(request).await
    }
}

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("account not found")]
    AccountNotFound,
    #[error("invoice not found")]
    InvoiceNotFound,
    #[error(transparent)]
    Billing(#[from] InvoiceError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UseCaseResult<T> = std::result::Result<T, CollectionError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub invoices_created: u32,
    pub payments_created: u32,
    pub failed: u32,
}

#[derive(Debug, Clone)]
pub struct CollectionSettings {
    pub currency: String,
    pub webhook_url: String,
    pub invoice_date: InvoiceDate,
}

enum CollectionOutcome {
    /// Month already billed or nothing billable.
    Skipped,
    /// Invoice created, nothing to collect at the gateway.
    Invoiced,
    /// Invoice created and a recurring payment placed.
    PaymentCreated,
    /// Invoice created but no mandate or the gateway refused; the account
    /// was mailed to pay manually.
    PaymentFailed,
}

/// The monthly collection run: bills every active subscription through the
/// invoice builder, then charges gateway collected invoices against the
/// account's recurring mandate.
pub struct CollectionUseCase<A, S, Cp, I, Cat, Sch, N, G>
where
    A: AccountRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Cp: ClasspassRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    Cat: CatalogRepository + Send + Sync + 'static,
    Sch: ScheduleRepository + Send + Sync + 'static,
    N: Notifier + 'static,
    G: MollieGateway + 'static,
{
    invoice_usecase: Arc<InvoiceUseCase<A, S, Cp, I, Cat, Sch, N>>,
    account_repo: Arc<A>,
    subscription_repo: Arc<S>,
    invoice_repo: Arc<I>,
    gateway: Arc<G>,
    notifier: Arc<N>,
    settings: CollectionSettings,
}

impl<A, S, Cp, I, Cat, Sch, N, G> CollectionUseCase<A, S, Cp, I, Cat, Sch, N, G>
where
    A: AccountRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Cp: ClasspassRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    Cat: CatalogRepository + Send + Sync + 'static,
    Sch: ScheduleRepository + Send + Sync + 'static,
    N: Notifier + 'static,
    G: MollieGateway + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        invoice_usecase: Arc<InvoiceUseCase<A, S, Cp, I, Cat, Sch, N>>,
        account_repo: Arc<A>,
        subscription_repo: Arc<S>,
        invoice_repo: Arc<I>,
        gateway: Arc<G>,
        notifier: Arc<N>,
        settings: CollectionSettings,
    ) -> Self {
        Self {
            invoice_usecase,
            account_repo,
            subscription_repo,
            invoice_repo,
            gateway,
            notifier,
            settings,
        }
    }

    /// Bills and collects one calendar month. A failure on one subscription
    /// is counted and logged, never aborts the batch.
    pub async fn collect_for_month(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> UseCaseResult<CollectionSummary> {
        info!(year, month, "collection: starting monthly collection run");

        let subscriptions = self
            .subscription_repo
            .list_active_in_month(year, month)
            .await?;

        let mut summary = CollectionSummary::default();

        for subscription in subscriptions {
            match self
                .process_subscription(&subscription, year, month, today)
                .await
            {
                Ok(CollectionOutcome::Skipped) => {}
                Ok(CollectionOutcome::Invoiced) => {
                    summary.invoices_created += 1;
                }
                Ok(CollectionOutcome::PaymentCreated) => {
                    summary.invoices_created += 1;
                    summary.payments_created += 1;
                }
                Ok(CollectionOutcome::PaymentFailed) => {
                    summary.invoices_created += 1;
                    summary.failed += 1;
                }
                Err(err) => {
                    warn!(
                        subscription_id = %subscription.id,
                        error = ?err,
                        "collection: subscription failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            year,
            month,
            invoices_created = summary.invoices_created,
            payments_created = summary.payments_created,
            failed = summary.failed,
            "collection: monthly collection run finished"
        );
        Ok(summary)
    }

    async fn process_subscription(
        &self,
        subscription: &SubscriptionEntity,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> UseCaseResult<CollectionOutcome> {
        let item = match self
            .invoice_usecase
            .create_subscription_invoice_for_month(
                subscription.id,
                year,
                month,
                None,
                self.settings.invoice_date,
                today,
            )
            .await?
        {
            Some(item) => item,
            None => return Ok(CollectionOutcome::Skipped),
        };

        let gateway_collected = PaymentMethod::from_str(&subscription.payment_method)
            .map(|method| method.is_gateway_collected())
            .unwrap_or(false);
        if !gateway_collected {
            return Ok(CollectionOutcome::Invoiced);
        }

        let invoice = self
            .invoice_repo
            .find_invoice_by_id(item.invoice_id)
            .await?
            .ok_or(CollectionError::InvoiceNotFound)?;

        // Zero priced months settle themselves as PAID in the builder.
        if invoice.status != InvoiceStatus::Sent.as_str() || invoice.total <= Decimal::ZERO {
            return Ok(CollectionOutcome::Invoiced);
        }

        let account = self
            .account_repo
            .find_by_id(subscription.account_id)
            .await?
            .ok_or(CollectionError::AccountNotFound)?;

        match self.charge_invoice(&account, &invoice).await {
            Ok(true) => Ok(CollectionOutcome::PaymentCreated),
            Ok(false) => {
                self.send_payment_failed_mail(&account, &invoice).await;
                Ok(CollectionOutcome::PaymentFailed)
            }
            Err(err) => {
                warn!(
                    invoice_id = %invoice.id,
                    account_id = %account.id,
                    error = ?err,
                    "collection: gateway charge failed"
                );
                self.send_payment_failed_mail(&account, &invoice).await;
                Ok(CollectionOutcome::PaymentFailed)
            }
        }
    }

    /// Places the recurring charge. Ok(false) when the customer holds no
    /// valid mandate.
    async fn charge_invoice(
        &self,
        account: &AccountEntity,
        invoice: &InvoiceEntity,
    ) -> UseCaseResult<bool> {
        let customer_id = self.resolve_customer(account).await?;

        let mandates = self.gateway.list_mandates(&customer_id).await?;
        if !mandates.iter().any(|mandate| mandate.is_valid()) {
            info!(
                account_id = %account.id,
                invoice_id = %invoice.id,
                "collection: no valid mandate for account"
            );
            return Ok(false);
        }

        let payment = self
            .gateway
            .create_payment(CreatePaymentRequest {
                amount: MollieAmount {
                    currency: self.settings.currency.clone(),
                    value: format!("{:.2}", invoice.total),
                },
                customer_id,
                sequence_type: SequenceType::Recurring,
                description: format!("{} - {}", invoice.summary, invoice.invoice_number),
                webhook_url: self.settings.webhook_url.clone(),
                redirect_url: None,
                metadata: json!({ "invoice_id": invoice.id }),
            })
            .await?;

        self.invoice_repo
            .insert_payment_log(InsertMolliePaymentLogEntity {
                invoice_id: invoice.id,
                mollie_payment_id: payment.id.clone(),
                recurring_type: Some(SequenceType::Recurring.to_string()),
                webhook_url: self.settings.webhook_url.clone(),
                log_source: COLLECTION_LOG_SOURCE.to_string(),
            })
            .await?;

        info!(
            invoice_id = %invoice.id,
            mollie_payment_id = %payment.id,
            "collection: recurring payment placed"
        );
        Ok(true)
    }

    /// The account's gateway customer, created and persisted when absent.
    /// A stored id the gateway no longer knows is replaced.
    async fn resolve_customer(&self, account: &AccountEntity) -> UseCaseResult<String> {
        if let Some(customer_id) = &account.mollie_customer_id {
            if self.gateway.get_customer(customer_id).await?.is_some() {
                return Ok(customer_id.clone());
            }
            warn!(
                account_id = %account.id,
                customer_id = %customer_id,
                "collection: stored mollie customer is gone, creating a new one"
            );
        }

        let customer = self
            .gateway
            .create_customer(&account.full_name, &account.email)
            .await?;

        self.account_repo
            .set_mollie_customer_id(account.id, customer.id.clone())
            .await?;

        info!(
            account_id = %account.id,
            customer_id = %customer.id,
            "collection: mollie customer created"
        );
        Ok(customer.id)
    }

    async fn send_payment_failed_mail(&self, account: &AccountEntity, invoice: &InvoiceEntity) {
        let context = json!({
            "account_id": account.id,
            "invoice_id": invoice.id,
            "invoice_number": invoice.invoice_number,
            "total": invoice.total,
        });

        if let Err(err) = self
            .notifier
            .send(MailTemplate::PaymentRecurringFailed, context)
            .await
        {
            warn!(
                account_id = %account.id,
                error = ?err,
                "collection: payment failed mail did not send"
            );
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
    use crate::domain::entities::catalog::{SubscriptionPlanEntity, SubscriptionPlanPriceEntity};
    use crate::domain::entities::invoice_items::InvoiceItemEntity;
    use crate::domain::entities::invoices::InvoiceGroupEntity;
    use crate::domain::repositories::accounts::MockAccountRepository;
    use crate::domain::repositories::catalog::MockCatalogRepository;
    use crate::domain::repositories::classpasses::MockClasspassRepository;
    use crate::domain::repositories::invoices::MockInvoiceRepository;
    use crate::domain::repositories::schedule::MockScheduleRepository;
    use crate::domain::repositories::subscriptions::MockSubscriptionRepository;

    type TestUseCase = CollectionUseCase<
        MockAccountRepository,
        MockSubscriptionRepository,
        MockClasspassRepository,
        MockInvoiceRepository,
        MockCatalogRepository,
        MockScheduleRepository,
        MockNotifier,
        MockMollieGateway,
    >;

    struct Mocks {
        account_repo: MockAccountRepository,
        subscription_repo: MockSubscriptionRepository,
        classpass_repo: MockClasspassRepository,
        invoice_repo: MockInvoiceRepository,
        catalog_repo: MockCatalogRepository,
        schedule_repo: MockScheduleRepository,
        notifier: MockNotifier,
        gateway: MockMollieGateway,
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
                gateway: MockMollieGateway::new(),
            }
        }

        fn into_usecase(self, group_id: Uuid) -> TestUseCase {
            let account_repo = Arc::new(self.account_repo);
            let subscription_repo = Arc::new(self.subscription_repo);
            let invoice_repo = Arc::new(self.invoice_repo);
            let notifier = Arc::new(self.notifier);

            let invoice_usecase = Arc::new(InvoiceUseCase::new(
                account_repo.clone(),
                subscription_repo.clone(),
                Arc::new(self.classpass_repo),
                invoice_repo.clone(),
                Arc::new(self.catalog_repo),
                Arc::new(self.schedule_repo),
                notifier.clone(),
                group_id,
            ));

            CollectionUseCase::new(
                invoice_usecase,
                account_repo,
                subscription_repo,
                invoice_repo,
                Arc::new(self.gateway),
                notifier,
                CollectionSettings {
                    currency: "EUR".to_string(),
                    webhook_url: "https://billing.example.com/webhooks/mollie".to_string(),
                    invoice_date: InvoiceDate::FirstOfMonth,
                },
            )
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn sample_account(id: Uuid, customer_id: Option<&str>) -> AccountEntity {
        AccountEntity {
            id,
            full_name: "Anna de Vries".to_string(),
            email: "anna@example.com".to_string(),
            address: "Kerkstraat 1".to_string(),
            postcode: "1017 GA".to_string(),
            city: "Amsterdam".to_string(),
            country: "NL".to_string(),
            invoice_to_business: None,
            mollie_customer_id: customer_id.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    fn sample_subscription(id: Uuid, account_id: Uuid, plan_id: Uuid, method: &str) -> SubscriptionEntity {
        SubscriptionEntity {
            id,
            account_id,
            subscription_plan_id: plan_id,
            date_start: date(2026, 1, 1),
            date_end: None,
            payment_method: method.to_string(),
            registration_fee_paid: true,
            note: String::new(),
            created_at: Utc::now(),
        }
    }

    fn sample_group(id: Uuid) -> InvoiceGroupEntity {
        InvoiceGroupEntity {
            id,
            name: "Subscriptions".to_string(),
            next_id: 1,
            numbering_year: 0,
            due_after_days: 14,
            prefix: "INV".to_string(),
            prefix_year: true,
            auto_reset_prefix_year: true,
            terms: String::new(),
            footer: String::new(),
        }
    }

    fn sample_invoice(id: Uuid, account_id: Uuid, group_id: Uuid, total: Decimal) -> InvoiceEntity {
        InvoiceEntity {
            id,
            account_id,
            business_id: None,
            invoice_group_id: group_id,
            invoice_number: "INV20265".to_string(),
            status: InvoiceStatus::Sent.to_string(),
            payment_method: Some(PaymentMethod::Mollie.to_string()),
            relation_company: String::new(),
            relation_company_registration: String::new(),
            relation_company_tax_registration: String::new(),
            relation_contact_name: "Anna de Vries".to_string(),
            relation_address: "Kerkstraat 1".to_string(),
            relation_postcode: "1017 GA".to_string(),
            relation_city: "Amsterdam".to_string(),
            relation_country: "NL".to_string(),
            summary: "Subscription invoice 2026-04".to_string(),
            note: String::new(),
            terms: String::new(),
            footer: String::new(),
            date_sent: date(2026, 4, 1),
            date_due: date(2026, 4, 15),
            date_last_reminder: None,
            subtotal: total,
            tax: Decimal::ZERO,
            total,
            paid: Decimal::ZERO,
            balance: total,
            credit_invoice_for: None,
            created_at: Utc::now(),
        }
    }

    fn sample_item(invoice_id: Uuid, subscription_id: Uuid) -> InvoiceItemEntity {
        InvoiceItemEntity {
            id: Uuid::new_v4(),
            invoice_id,
            subscription_id: Some(subscription_id),
            subscription_year: Some(2026),
            subscription_month: Some(4),
            classpass_id: None,
            membership_id: None,
            product_id: None,
            event_ticket_id: None,
            line_number: 0,
            product_name: format!("Subscription {subscription_id}"),
            description: "Gold [2026-04-01 - 2026-04-30]".to_string(),
            quantity: Decimal::ONE,
            price: dec!(90.00),
            subtotal: dec!(90.00),
            tax: Decimal::ZERO,
            total: dec!(90.00),
            tax_rate_id: None,
            gl_account_id: None,
            cost_center_id: None,
        }
    }

    fn sample_plan(id: Uuid) -> SubscriptionPlanEntity {
        SubscriptionPlanEntity {
            id,
            name: "Gold".to_string(),
            classes: 8,
            unlimited: false,
            registration_fee: Decimal::ZERO,
            tax_rate_id: None,
            gl_account_id: None,
            cost_center_id: None,
        }
    }

    fn valid_mandate() -> MollieMandate {
        MollieMandate {
            id: "mdt_1".to_string(),
            status: "valid".to_string(),
            method: "directdebit".to_string(),
        }
    }

    /// Wires the whole billing path for one subscription so the collection
    /// run can flow through invoice creation.
    fn expect_billing_flow(
        mocks: &mut Mocks,
        group_id: Uuid,
        account_id: Uuid,
        invoice_id: Uuid,
        customer_id: Option<&'static str>,
    ) {
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
            .returning(move |id| {
                Box::pin(async move { Ok(Some(sample_account(id, customer_id))) })
            });
        mocks
            .invoice_repo
            .expect_find_group_by_id()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_group(id))) }));
        mocks
            .invoice_repo
            .expect_reserve_invoice_number()
            .returning(|_, _| Box::pin(async { Ok("INV20265".to_string()) }));
        mocks
            .invoice_repo
            .expect_insert_invoice()
            .returning(move |_| Box::pin(async move { Ok(invoice_id) }));
        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_invoice(id, account_id, group_id, dec!(90.00))))
                })
            });
        mocks
            .catalog_repo
            .expect_find_subscription_plan()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_plan(id))) }));
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
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));
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
            .returning(move |_| {
                Box::pin(async move { Ok(Some(sample_item(invoice_id, Uuid::new_v4()))) })
            });
    }

    #[tokio::test]
    async fn collection_bills_and_charges_a_mollie_subscription() {
        let group_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let invoice_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        let listed = sample_subscription(subscription_id, account_id, plan_id, "MOLLIE");
        mocks
            .subscription_repo
            .expect_list_active_in_month()
            .with(eq(2026), eq(4))
            .returning(move |_, _| {
                let listed = listed.clone();
                Box::pin(async move { Ok(vec![listed]) })
            });
        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_subscription(id, account_id, plan_id, "MOLLIE")))
                })
            });
        expect_billing_flow(&mut mocks, group_id, account_id, invoice_id, Some("cst_123"));

        mocks
            .notifier
            .expect_send()
            .withf(|template, _| *template == MailTemplate::InvoiceNotification)
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        mocks
            .gateway
            .expect_get_customer()
            .with(eq("cst_123"))
            .returning(|id| {
                let id = id.to_string();
                Box::pin(async move {
                    Ok(Some(MollieCustomer {
                        id,
                        name: "Anna de Vries".to_string(),
                        email: "anna@example.com".to_string(),
                    }))
                })
            });
        mocks
            .gateway
            .expect_list_mandates()
            .with(eq("cst_123"))
            .returning(|_| Box::pin(async { Ok(vec![valid_mandate()]) }));
        mocks
            .gateway
            .expect_create_payment()
            .times(1)
            .returning(move |request| {
                assert_eq!(request.amount.currency, "EUR");
                assert_eq!(request.amount.value, "90.00");
                assert_eq!(request.customer_id, "cst_123");
                assert_eq!(request.sequence_type, SequenceType::Recurring);
                assert_eq!(
                    request.description,
                    "Subscription invoice 2026-04 - INV20265"
                );
                assert_eq!(request.redirect_url, None);
                assert_eq!(
                    request.metadata["invoice_id"],
                    serde_json::to_value(invoice_id).unwrap()
                );
                Box::pin(async {
                    Ok(MolliePayment {
                        id: "tr_abc".to_string(),
                        status: "open".to_string(),
                    })
                })
            });
        mocks
            .invoice_repo
            .expect_insert_payment_log()
            .times(1)
            .returning(move |log| {
                assert_eq!(log.invoice_id, invoice_id);
                assert_eq!(log.mollie_payment_id, "tr_abc");
                assert_eq!(log.recurring_type.as_deref(), Some("recurring"));
                assert_eq!(log.log_source, "SUBSCRIPTION_COLLECTION");
                Box::pin(async { Ok(Uuid::new_v4()) })
            });

        let usecase = mocks.into_usecase(group_id);

        let summary = usecase
            .collect_for_month(2026, 4, date(2026, 4, 1))
            .await
            .unwrap();

        assert_eq!(summary.invoices_created, 1);
        assert_eq!(summary.payments_created, 1);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn collection_without_mandate_mails_for_manual_payment() {
        let group_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let invoice_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        let listed = sample_subscription(subscription_id, account_id, plan_id, "MOLLIE");
        mocks
            .subscription_repo
            .expect_list_active_in_month()
            .returning(move |_, _| {
                let listed = listed.clone();
                Box::pin(async move { Ok(vec![listed]) })
            });
        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_subscription(id, account_id, plan_id, "MOLLIE")))
                })
            });
        expect_billing_flow(&mut mocks, group_id, account_id, invoice_id, Some("cst_123"));

        mocks
            .notifier
            .expect_send()
            .withf(|template, _| *template == MailTemplate::InvoiceNotification)
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .notifier
            .expect_send()
            .withf(|template, context| {
                *template == MailTemplate::PaymentRecurringFailed
                    && context["invoice_number"] == "INV20265"
            })
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        mocks
            .gateway
            .expect_get_customer()
            .returning(|id| {
                let id = id.to_string();
                Box::pin(async move {
                    Ok(Some(MollieCustomer {
                        id,
                        name: "Anna de Vries".to_string(),
                        email: "anna@example.com".to_string(),
                    }))
                })
            });
        mocks
            .gateway
            .expect_list_mandates()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks.gateway.expect_create_payment().never();

        let usecase = mocks.into_usecase(group_id);

        let summary = usecase
            .collect_for_month(2026, 4, date(2026, 4, 1))
            .await
            .unwrap();

        assert_eq!(summary.invoices_created, 1);
        assert_eq!(summary.payments_created, 0);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn collection_skips_already_billed_months() {
        let group_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        let listed = sample_subscription(subscription_id, account_id, plan_id, "MOLLIE");
        mocks
            .subscription_repo
            .expect_list_active_in_month()
            .returning(move |_, _| {
                let listed = listed.clone();
                Box::pin(async move { Ok(vec![listed]) })
            });
        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_subscription(id, account_id, plan_id, "MOLLIE")))
                })
            });
        mocks
            .invoice_repo
            .expect_subscription_item_exists()
            .returning(|_, _, _| Box::pin(async { Ok(true) }));
        mocks.invoice_repo.expect_insert_invoice().never();
        mocks.gateway.expect_create_payment().never();

        let usecase = mocks.into_usecase(group_id);

        let summary = usecase
            .collect_for_month(2026, 4, date(2026, 4, 1))
            .await
            .unwrap();

        assert_eq!(summary, CollectionSummary::default());
    }

    #[tokio::test]
    async fn collection_leaves_cash_subscriptions_uncollected() {
        let group_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let invoice_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        let listed = sample_subscription(subscription_id, account_id, plan_id, "CASH");
        mocks
            .subscription_repo
            .expect_list_active_in_month()
            .returning(move |_, _| {
                let listed = listed.clone();
                Box::pin(async move { Ok(vec![listed]) })
            });
        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_subscription(id, account_id, plan_id, "CASH")))
                })
            });
        expect_billing_flow(&mut mocks, group_id, account_id, invoice_id, None);

        mocks
            .notifier
            .expect_send()
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks.gateway.expect_get_customer().never();
        mocks.gateway.expect_list_mandates().never();
        mocks.gateway.expect_create_payment().never();

        let usecase = mocks.into_usecase(group_id);

        let summary = usecase
            .collect_for_month(2026, 4, date(2026, 4, 1))
            .await
            .unwrap();

        assert_eq!(summary.invoices_created, 1);
        assert_eq!(summary.payments_created, 0);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn collection_creates_a_missing_mollie_customer() {
        let group_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let invoice_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        let listed = sample_subscription(subscription_id, account_id, plan_id, "MOLLIE");
        mocks
            .subscription_repo
            .expect_list_active_in_month()
            .returning(move |_, _| {
                let listed = listed.clone();
                Box::pin(async move { Ok(vec![listed]) })
            });
        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_subscription(id, account_id, plan_id, "MOLLIE")))
                })
            });
        expect_billing_flow(&mut mocks, group_id, account_id, invoice_id, None);

        mocks
            .notifier
            .expect_send()
            .returning(|_, _| Box::pin(async { Ok(()) }));

        mocks.gateway.expect_get_customer().never();
        mocks
            .gateway
            .expect_create_customer()
            .with(eq("Anna de Vries"), eq("anna@example.com"))
            .times(1)
            .returning(|_, _| {
                Box::pin(async {
                    Ok(MollieCustomer {
                        id: "cst_new".to_string(),
                        name: "Anna de Vries".to_string(),
                        email: "anna@example.com".to_string(),
                    })
                })
            });
        mocks
            .account_repo
            .expect_set_mollie_customer_id()
            .with(eq(account_id), eq("cst_new".to_string()))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .gateway
            .expect_list_mandates()
            .with(eq("cst_new"))
            .returning(|_| Box::pin(async { Ok(vec![valid_mandate()]) }));
        mocks
            .gateway
            .expect_create_payment()
            .returning(|_| {
                Box::pin(async {
                    Ok(MolliePayment {
                        id: "tr_new".to_string(),
                        status: "open".to_string(),
                    })
                })
            });
        mocks
            .invoice_repo
            .expect_insert_payment_log()
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let usecase = mocks.into_usecase(group_id);

        let summary = usecase
            .collect_for_month(2026, 4, date(2026, 4, 1))
            .await
            .unwrap();

        assert_eq!(summary.payments_created, 1);
    }

    #[tokio::test]
    async fn gateway_failure_does_not_abort_the_batch() {
        let group_id = Uuid::new_v4();
        let first_account = Uuid::new_v4();
        let second_account = Uuid::new_v4();
        let first_subscription = Uuid::new_v4();
        let second_subscription = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let invoice_id = Uuid::new_v4();

        let mut mocks = Mocks::new();

        let listed = vec![
            sample_subscription(first_subscription, first_account, plan_id, "MOLLIE"),
            sample_subscription(second_subscription, second_account, plan_id, "MOLLIE"),
        ];
        mocks
            .subscription_repo
            .expect_list_active_in_month()
            .returning(move |_, _| {
                let listed = listed.clone();
                Box::pin(async move { Ok(listed) })
            });
        mocks
            .subscription_repo
            .expect_find_by_id()
            .returning(move |id| {
                let account_id = if id == first_subscription {
                    first_account
                } else {
                    second_account
                };
                Box::pin(async move {
                    Ok(Some(sample_subscription(id, account_id, plan_id, "MOLLIE")))
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
            .returning(move |id| {
                let customer = if id == first_account {
                    "cst_bad"
                } else {
                    "cst_good"
                };
                Box::pin(async move { Ok(Some(sample_account(id, Some(customer)))) })
            });
        mocks
            .invoice_repo
            .expect_find_group_by_id()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_group(id))) }));
        mocks
            .invoice_repo
            .expect_reserve_invoice_number()
            .returning(|_, _| Box::pin(async { Ok("INV20265".to_string()) }));
        mocks
            .invoice_repo
            .expect_insert_invoice()
            .times(2)
            .returning(move |_| Box::pin(async move { Ok(invoice_id) }));
        mocks
            .invoice_repo
            .expect_find_invoice_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(sample_invoice(id, first_account, group_id, dec!(90.00))))
                })
            });
        mocks
            .catalog_repo
            .expect_find_subscription_plan()
            .returning(move |id| Box::pin(async move { Ok(Some(sample_plan(id))) }));
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
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));
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
            .returning(move |_| {
                Box::pin(async move { Ok(Some(sample_item(invoice_id, Uuid::new_v4()))) })
            });

        mocks
            .notifier
            .expect_send()
            .withf(|template, _| *template == MailTemplate::InvoiceNotification)
            .times(2)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .notifier
            .expect_send()
            .withf(|template, _| *template == MailTemplate::PaymentRecurringFailed)
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        mocks
            .gateway
            .expect_get_customer()
            .returning(|id| {
                let id = id.to_string();
                Box::pin(async move {
                    Ok(Some(MollieCustomer {
                        id,
                        name: "Anna de Vries".to_string(),
                        email: "anna@example.com".to_string(),
                    }))
                })
            });
        mocks
            .gateway
            .expect_list_mandates()
            .returning(|_| Box::pin(async { Ok(vec![valid_mandate()]) }));
        mocks
            .gateway
            .expect_create_payment()
            .times(2)
            .returning(|request| {
                Box::pin(async move {
                    if request.customer_id == "cst_bad" {
                        Err(anyhow::anyhow!("mollie is down"))
                    } else {
                        Ok(MolliePayment {
                            id: "tr_ok".to_string(),
                            status: "open".to_string(),
                        })
                    }
                })
            });
        mocks
            .invoice_repo
            .expect_insert_payment_log()
            .times(1)
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let usecase = mocks.into_usecase(group_id);

        let summary = usecase
            .collect_for_month(2026, 4, date(2026, 4, 1))
            .await
            .unwrap();

        assert_eq!(summary.invoices_created, 2);
        assert_eq!(summary.payments_created, 1);
        assert_eq!(summary.failed, 1);
    }
}
