//! # Alert Delivery
//!
//! Fire-and-forget alert seam: a message and a channel go in, delivery is
//! someone else's problem. The production sink posts to a Slack incoming
//! webhook; dry runs print to stdout.

use anyhow::{Context, Result};
use serde_json::json;

/// Delivery seam for human-facing alerts.
pub trait AlertSink {
    /// Deliver `message` to `channel`.
    fn send(&self, channel: &str, message: &str) -> Result<()>;
}

/// [`AlertSink`] posting simple messages to a Slack incoming webhook.
pub struct SlackWebhook {
    client: reqwest::blocking::Client,
    webhook_url: String,
}

impl SlackWebhook {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            webhook_url: webhook_url.into(),
        }
    }
}

impl AlertSink for SlackWebhook {
    fn send(&self, channel: &str, message: &str) -> Result<()> {
        tracing::info!(channel, "sending alert");
        let payload = json!({
            "channel": channel,
            "text": message,
        });
        self.client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .and_then(|response| response.error_for_status())
            .context("webhook post failed")?;
        Ok(())
    }
}

/// [`AlertSink`] that prints instead of delivering.
pub struct StdoutSink;

impl AlertSink for StdoutSink {
    fn send(&self, channel: &str, message: &str) -> Result<()> {
        println!("[{channel}]\n{message}");
        Ok(())
    }
}
