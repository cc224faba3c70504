// src/notifications/mailer.rs

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::Config;
use crate::notifications::templates::RenderedEmail;

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<()>;
}

/// Delivers through the SendGrid v3 API.
#[derive(Debug, Clone)]
pub struct SendGridMailer {
    client: Client,
    api_key: String,
    from_email: String,
}

impl SendGridMailer {
    pub fn new(api_key: String, from_email: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key,
            from_email,
        })
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<()> {
        let payload = json!({
            "personalizations": [{"to": [{"email": to}]}],
            "from": {"email": self.from_email},
            "subject": email.subject,
            "content": [
                {"type": "text/plain", "value": email.text},
                {"type": "text/html", "value": email.html}
            ]
        });

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to call SendGrid")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("SendGrid returned {status}: {body}");
        }

        tracing::info!(to = %to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// Used when no email API key is configured: logs instead of sending.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<()> {
        tracing::info!(to = %to, subject = %email.subject, "Email delivery disabled, not sending");
        Ok(())
    }
}

/// Picks the transport from configuration.
pub fn from_config(config: &Config) -> Result<Arc<dyn Mailer>> {
    match &config.sendgrid_api_key {
        Some(key) => Ok(Arc::new(SendGridMailer::new(
            key.clone(),
            config.from_email.clone(),
        )?)),
        None => {
            tracing::warn!("SENDGRID_API_KEY not set, emails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}
