//! HTTP transport for transactional-email provider APIs

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::{
    error::ConfigurationError,
    transport::{MailTransport, OutboundEmail, TransportConfig, TransportError},
};

/// Request body in the provider's wire shape.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    sender: Party<'a>,
    to: [Party<'a>; 1],
    subject: &'a str,
    #[serde(rename = "htmlContent")]
    html_content: &'a str,
    #[serde(rename = "textContent")]
    text_content: &'a str,
}

#[derive(Debug, Serialize)]
struct Party<'a> {
    name: &'a str,
    email: &'a str,
}

/// Transport that POSTs messages to a transactional-email HTTP API.
///
/// One request per [`send`](MailTransport::send) call, authenticated with an
/// `api-key` header, bounded by the configured per-request timeout. Holds no
/// local state beyond the connection pool inside the client.
#[derive(Debug, Clone)]
pub struct HttpApiTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpApiTransport {
    /// Build a transport from validated configuration.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &TransportConfig) -> Result<Self, ConfigurationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for HttpApiTransport {
    async fn send(&self, email: &OutboundEmail<'_>) -> Result<(), TransportError> {
        let request = SendRequest {
            sender: Party {
                name: &email.sender.name,
                email: &email.sender.email,
            },
            to: [Party {
                name: &email.recipient.name,
                email: &email.recipient.email,
            }],
            subject: email.subject,
            html_content: email.html_body,
            text_content: email.text_body,
        };

        debug!(
            recipient = %email.recipient.email,
            subject = %email.subject,
            "Attempting provider send"
        );

        let response = self
            .client
            .post(&self.api_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(e.to_string())
                } else {
                    TransportError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Provider accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = match status.as_u16() {
            401 => format!("{body}. Check that the transport API key is valid."),
            400 => format!("{body}. Check that the sender address is verified with the provider."),
            _ => body,
        };

        Err(TransportError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
