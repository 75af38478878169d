use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::application::usecases::notifications::Notifier;
use crate::domain::value_objects::enums::mail_templates::MailTemplate;

/// Posts mail jobs to the mail service webhook. The receiving side renders
/// the template and delivers the message.
pub struct WebhookMailer {
    http: reqwest::Client,
    webhook_url: String,
}

impl WebhookMailer {
    pub fn new(webhook_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self { http, webhook_url })
    }
}

#[async_trait]
impl Notifier for WebhookMailer {
    async fn send(&self, template: MailTemplate, context: Value) -> Result<()> {
        let body = json!({
            "template": template.as_str(),
            "context": context,
        });

        let response = self
            .http
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "mail webhook returned non-success status: {}",
            response.status()
        ))
    }
}

fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("mail webhook request timed out");
    }
    if error.is_connect() {
        return anyhow!("mail webhook connection failed");
    }
    anyhow!("mail webhook request failed")
}
