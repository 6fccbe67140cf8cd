use askama::Template;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SITE_NAME: &str = "Froebel School Volunteer Site";
const MAGIC_LINK_SUBJECT: &str = "Your Magic Link to Sign In";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum EmailError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Email provider rejected the message: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to render email: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Template)]
#[template(path = "emails/magic_link.html")]
struct MagicLinkEmail<'a> {
    site_name: &'a str,
    link_url: &'a str,
    ttl_minutes: i64,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SendEmailResponse {
    pub id: String,
}

/// Client for the Resend transactional email API
#[derive(Debug, Clone)]
pub struct EmailClient {
    http: Client,
    base_url: String,
    api_key: Secret<String>,
    sender: String,
}

impl EmailClient {
    pub fn new(base_url: &str, api_key: Secret<String>, sender: &str) -> Result<Self, EmailError> {
        Self::with_timeout(base_url, api_key, sender, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        api_key: Secret<String>,
        sender: &str,
        timeout: Duration,
    ) -> Result<Self, EmailError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            sender: sender.to_string(),
        })
    }

    /// Sends the sign-in email for a freshly issued magic link
    #[tracing::instrument(skip(self, link_url))]
    pub async fn send_magic_link(
        &self,
        to: &str,
        link_url: &str,
        ttl_minutes: i64,
    ) -> Result<SendEmailResponse, EmailError> {
        let html = MagicLinkEmail {
            site_name: SITE_NAME,
            link_url,
            ttl_minutes,
        }
        .render()?;

        self.send(to, MAGIC_LINK_SUBJECT, &html).await
    }

    #[tracing::instrument(skip(self, html))]
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<SendEmailResponse, EmailError> {
        let url = format!("{}/emails", self.base_url);
        let request_body = SendEmailRequest {
            from: &self.sender,
            to: vec![to],
            subject,
            html,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(status = %status, error = %body, "Email provider request failed");

            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendEmailResponse = response.json().await?;
        tracing::info!(email_id = %sent.id, "Email accepted by provider");

        Ok(sent)
    }
}
