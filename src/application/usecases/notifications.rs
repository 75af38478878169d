use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::domain::value_objects::enums::mail_templates::MailTemplate;

/// Outbound mail, reached through whatever transport is configured.
/// Sending is best effort: callers log failures and move on, financial
/// state never depends on a notification going out.
#[async_trait]
#[mockall::automock]
pub trait Notifier: Send + Sync {
    async fn send(&self, template: MailTemplate, context: Value) -> Result<()>;
}
