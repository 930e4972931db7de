//! Webhook notifier: POSTs due tasks as JSON to a configured URL.

use super::Notifier;
use crate::tasks::Task;
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct WebhookBody<'a> {
    text: String,
    task: &'a Task,
}

/// Sends `{ "text": ..., "task": ... }` to a webhook endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            anyhow::bail!("webhook url must not be empty");
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn id(&self) -> &'static str {
        "webhook"
    }

    async fn notify(&self, task: &Task) -> anyhow::Result<()> {
        let body = WebhookBody {
            text: task.notification_message(),
            task,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("webhook request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("webhook {} responded with {status}", self.url);
        }
        Ok(())
    }
}
