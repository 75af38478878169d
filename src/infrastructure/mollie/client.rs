use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::value_objects::enums::sequence_types::SequenceType;

/// Minimal Mollie client built on reqwest. Covers the customer, mandate and
/// recurring payment endpoints the collection run needs.
pub struct MollieClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Error)]
pub enum MollieError {
    #[error("mollie api rejected the request: {status} {title}: {detail}")]
    Api {
        status: u16,
        title: String,
        detail: String,
    },
    #[error("mollie api request timed out")]
    Timeout,
    #[error("mollie api request failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MollieCustomer {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MollieMandate {
    pub id: String,
    pub status: String,
    pub method: String,
}

impl MollieMandate {
    /// Recurring charges need a valid mandate; pending and invalid ones
    /// cannot carry a payment.
    pub fn is_valid(&self) -> bool {
        self.status == "valid"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MolliePayment {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MollieAmount {
    pub currency: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct CreatePaymentRequest {
    pub amount: MollieAmount,
    pub customer_id: String,
    pub sequence_type: SequenceType,
    pub description: String,
    pub webhook_url: String,
    pub redirect_url: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentBody<'a> {
    amount: &'a MollieAmount,
    customer_id: &'a str,
    sequence_type: &'a str,
    description: &'a str,
    webhook_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_url: Option<&'a str>,
    metadata: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MollieErrorEnvelope {
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MandateList {
    #[serde(rename = "_embedded")]
    embedded: MandateListEmbedded,
}

#[derive(Debug, Deserialize)]
struct MandateListEmbedded {
    mandates: Vec<MollieMandate>,
}

impl MollieClient {
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<reqwest::Response, MollieError> {
        request.send().await.map_err(|err| {
            if err.is_timeout() {
                MollieError::Timeout
            } else {
                MollieError::Transport(err.to_string())
            }
        })
    }

    /// Sends the request, retrying exactly once on a timeout or a 5xx.
    async fn send_with_retry<F>(
        &self,
        context: &str,
        build: F,
    ) -> std::result::Result<reqwest::Response, MollieError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        match self.dispatch(build()).await {
            Ok(resp) if resp.status().is_server_error() => {
                warn!(
                    status = %resp.status(),
                    context = %context,
                    "mollie api returned a server error, retrying once"
                );
            }
            Err(MollieError::Timeout) => {
                warn!(context = %context, "mollie api request timed out, retrying once");
            }
            other => return other,
        }

        self.dispatch(build()).await
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> std::result::Result<reqwest::Response, MollieError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (title, detail) = match serde_json::from_str::<MollieErrorEnvelope>(&body) {
            Ok(envelope) => (
                envelope.title.unwrap_or_else(|| "unknown".to_string()),
                envelope.detail.unwrap_or_else(|| body.clone()),
            ),
            Err(_) => ("unknown".to_string(), body.clone()),
        };

        error!(
            status = %status,
            mollie_error_title = %title,
            mollie_error_detail = %detail,
            context = %context,
            "mollie api request failed"
        );

        Err(MollieError::Api {
            status: status.as_u16(),
            title,
            detail,
        })
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Fetches a customer; Ok(None) when Mollie no longer knows the id.
    pub async fn get_customer(&self, customer_id: &str) -> Result<Option<MollieCustomer>> {
        // https://docs.mollie.com/reference/v2/customers-api/get-customer
        let url = format!("{}/customers/{}", self.api_url, customer_id);

        let resp = self
            .send_with_retry("get customer", || {
                self.http.get(&url).header(AUTHORIZATION, self.auth_header())
            })
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = Self::ensure_success(resp, "get customer").await?;

        let customer: MollieCustomer = resp.json().await?;
        Ok(Some(customer))
    }

    pub async fn create_customer(&self, name: &str, email: &str) -> Result<MollieCustomer> {
        // https://docs.mollie.com/reference/v2/customers-api/create-customer
        let url = format!("{}/customers", self.api_url);
        let body = json!({ "name": name, "email": email });

        let resp = self
            .send_with_retry("create customer", || {
                self.http
                    .post(&url)
                    .header(AUTHORIZATION, self.auth_header())
                    .json(&body)
            })
            .await?;
        let resp = Self::ensure_success(resp, "create customer").await?;

        let customer: MollieCustomer = resp.json().await?;
        Ok(customer)
    }

    pub async fn list_mandates(&self, customer_id: &str) -> Result<Vec<MollieMandate>> {
        // https://docs.mollie.com/reference/v2/mandates-api/list-mandates
        let url = format!("{}/customers/{}/mandates", self.api_url, customer_id);

        let resp = self
            .send_with_retry("list mandates", || {
                self.http.get(&url).header(AUTHORIZATION, self.auth_header())
            })
            .await?;
        let resp = Self::ensure_success(resp, "list mandates").await?;

        let list: MandateList = resp.json().await?;
        Ok(list.embedded.mandates)
    }

    pub async fn create_payment(&self, request: CreatePaymentRequest) -> Result<MolliePayment> {
        // https://docs.mollie.com/reference/v2/payments-api/create-payment
        let url = format!("{}/payments", self.api_url);
        let body = CreatePaymentBody {
            amount: &request.amount,
            customer_id: &request.customer_id,
            sequence_type: request.sequence_type.as_str(),
            description: &request.description,
            webhook_url: &request.webhook_url,
            redirect_url: request.redirect_url.as_deref(),
            metadata: &request.metadata,
        };

        let resp = self
            .send_with_retry("create payment", || {
                self.http
                    .post(&url)
                    .header(AUTHORIZATION, self.auth_header())
                    .json(&body)
            })
            .await?;
        let resp = Self::ensure_success(resp, "create payment").await?;

        let payment: MolliePayment = resp.json().await?;
        Ok(payment)
    }
}
