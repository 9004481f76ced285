//! Outbound email.
//!
//! Providers:
//! - `console`: logs the message (development)
//! - `sendgrid`: SendGrid v3 mail API

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// Delivery seam. Handlers only see this trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        info!(body_text = %message.body_text, "Email body");
        Ok(())
    }

    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let body = sendgrid_payload(&self.config, &message);

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(to = %message.to, subject = %message.subject, "Email disabled, skipping send");
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }
}

fn sendgrid_payload(config: &EmailConfig, message: &EmailMessage) -> serde_json::Value {
    let mut to = json!({ "email": message.to });
    if let Some(name) = &message.to_name {
        to["name"] = json!(name);
    }

    let mut content = vec![json!({ "type": "text/plain", "value": message.body_text })];
    if let Some(html) = &message.body_html {
        content.push(json!({ "type": "text/html", "value": html }));
    }

    json!({
        "personalizations": [{ "to": [to] }],
        "from": { "email": config.sender_email, "name": config.sender_name },
        "subject": message.subject,
        "content": content,
    })
}

/// Account verification message carrying the raw token.
pub fn verification_email(
    config: &EmailConfig,
    to_email: &str,
    to_name: &str,
    token: &str,
    ttl_hours: i64,
) -> EmailMessage {
    let url = format!(
        "{}/api/auth/verifyemail/{}",
        config.api_base_url.trim_end_matches('/'),
        token
    );

    let body_text = format!(
        "Hi {to_name},\n\n\
         Please confirm your CICR Connect account by opening the link below:\n\n\
         {url}\n\n\
         This link expires in {ttl_hours} hours.\n\n\
         If you did not sign up, you can ignore this email."
    );

    let body_html = format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: auto; border: 1px solid #e2e8f0; border-radius: 12px; padding: 24px;">
    <h2 style="color: #2563eb;">Verify your email</h2>
    <p>Hi {to_name},</p>
    <p>Confirm your <strong>CICR Connect</strong> account to start using the portal.</p>
    <p style="text-align: center; margin: 24px 0;"><a href="{url}" style="background: #2563eb; color: white; padding: 12px 24px; border-radius: 6px; text-decoration: none;">Verify Email</a></p>
    <p style="color: #64748b; font-size: 14px;">This link expires in {ttl_hours} hours.</p>
</div>"#
    );

    EmailMessage {
        to: to_email.to_string(),
        to_name: Some(to_name.to_string()),
        subject: "Verify your CICR Connect account".to_string(),
        body_text,
        body_html: Some(body_html),
    }
}

/// Invitation message carrying a registration code.
pub fn invite_email(config: &EmailConfig, to_email: &str, invite_code: &str) -> EmailMessage {
    let url = format!("{}/login", config.base_url.trim_end_matches('/'));

    let body_text = format!(
        "You've been invited to join CICR Connect.\n\n\
         Use this code during registration: {invite_code}\n\n\
         Register at: {url}"
    );

    let body_html = format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: auto; border: 1px solid #e2e8f0; border-radius: 12px; padding: 24px;">
    <h2 style="color: #2563eb;">Lab Invitation</h2>
    <p>You've been invited to join <strong>CICR Connect</strong>.</p>
    <p>Use this code during registration:</p>
    <div style="background: #f8fafc; border: 2px dashed #cbd5e1; padding: 16px; text-align: center; margin: 20px 0;">
        <span style="font-size: 24px; font-weight: bold; letter-spacing: 4px;">{invite_code}</span>
    </div>
    <p>Register at: <a href="{url}">CICR Portal</a></p>
</div>"#
    );

    EmailMessage {
        to: to_email.to_string(),
        to_name: None,
        subject: "CICR Connect Invitation".to_string(),
        body_text,
        body_html: Some(body_html),
    }
}
