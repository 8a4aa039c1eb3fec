//! Outbound email delivery over one of two transports, chosen once at
//! startup: the SendGrid HTTP API when a key is configured, otherwise
//! direct SMTP with STARTTLS.
//!
//! Send methods never return `Err`; every attempt produces a `SendOutcome`
//! so batch callers get a uniform per-item record.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::config::Config;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// One email to deliver. Correlation ids are opaque to the mailer and
/// echoed unchanged on the outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct OutboundEmail {
    pub to_email: String,
    pub subject: String,
    pub body: String,
    /// Overrides the configured sender for this message only.
    pub from_email: Option<String>,
    pub contact_id: Option<i64>,
    pub company_id: Option<i64>,
}

/// Per-attempt delivery record.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    pub success: bool,
    /// `smtp` or `sendgrid`.
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub to_email: String,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
}

enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    SendGrid {
        http: reqwest::Client,
        api_key: String,
    },
}

pub struct Mailer {
    transport: Transport,
    from_email: String,
    from_name: Option<String>,
}

impl Mailer {
    /// Builds the mailer from configuration. SendGrid wins when keyed;
    /// SMTP credentials are optional (open relays, local debug servers).
    pub fn new(config: &Config) -> Result<Self> {
        let transport = match config.sendgrid_api_key.clone() {
            Some(api_key) => {
                info!("Mail transport: SendGrid API");
                let http = reqwest::Client::builder()
                    .timeout(Duration::from_secs(15))
                    .build()
                    .context("Failed to build SendGrid HTTP client")?;
                Transport::SendGrid { http, api_key }
            }
            None => {
                info!(
                    "Mail transport: SMTP via {}:{}",
                    config.smtp.host, config.smtp.port
                );
                let mut builder =
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp.host)
                        .with_context(|| {
                            format!("Failed to configure SMTP relay {}", config.smtp.host)
                        })?
                        .port(config.smtp.port);
                if let (Some(username), Some(password)) =
                    (&config.smtp.username, &config.smtp.password)
                {
                    builder =
                        builder.credentials(Credentials::new(username.clone(), password.clone()));
                }
                Transport::Smtp(builder.build())
            }
        };

        Ok(Self {
            transport,
            from_email: config.smtp.from_email.clone(),
            from_name: config.smtp.from_name.clone(),
        })
    }

    pub fn method(&self) -> &'static str {
        match self.transport {
            Transport::Smtp(_) => "smtp",
            Transport::SendGrid { .. } => "sendgrid",
        }
    }

    /// Delivers one email. Failures are captured on the outcome, never
    /// returned, so a batch can keep going.
    pub async fn send(&self, email: &OutboundEmail) -> SendOutcome {
        let result = match &self.transport {
            Transport::Smtp(transport) => self.send_smtp(transport, email).await,
            Transport::SendGrid { http, api_key } => {
                self.send_sendgrid(http, api_key, email).await
            }
        };

        let mut outcome = SendOutcome {
            success: false,
            method: self.method(),
            message: None,
            error: None,
            to_email: email.to_email.clone(),
            subject: email.subject.clone(),
            sent_at: Utc::now(),
            batch_index: None,
            contact_id: email.contact_id,
            company_id: email.company_id,
        };

        match result {
            Ok(message) => {
                info!("Sent email to {} via {}", email.to_email, self.method());
                outcome.success = true;
                outcome.message = Some(message);
            }
            Err(e) => {
                error!("Failed to send email to {}: {e}", email.to_email);
                outcome.error = Some(e.to_string());
            }
        }

        outcome
    }

    /// Delivers a batch in order with a fixed pause between consecutive
    /// sends (none after the last). One failure produces one failed
    /// outcome; the rest of the batch still goes out.
    pub async fn send_batch(&self, emails: &[OutboundEmail], delay: Duration) -> Vec<SendOutcome> {
        run_batch(emails, delay, |email| async move { self.send(&email).await }).await
    }

    /// Verifies the transport without sending anything. SMTP opens and
    /// closes a connection; SendGrid only sanity-checks the credential
    /// shape, since the API has no side-effect-free auth endpoint.
    pub async fn test_connection(&self) -> Result<String> {
        match &self.transport {
            Transport::Smtp(transport) => {
                let ok = transport
                    .test_connection()
                    .await
                    .context("SMTP connection test failed")?;
                if ok {
                    Ok("SMTP connection successful".to_string())
                } else {
                    Err(anyhow!("SMTP server did not accept the connection"))
                }
            }
            Transport::SendGrid { api_key, .. } => {
                if api_key.len() > 20 {
                    Ok("SendGrid API key is configured".to_string())
                } else {
                    Err(anyhow!("SendGrid API key looks malformed"))
                }
            }
        }
    }

    async fn send_smtp(
        &self,
        transport: &AsyncSmtpTransport<Tokio1Executor>,
        email: &OutboundEmail,
    ) -> Result<String> {
        let from = self.format_from(email);
        let message = Message::builder()
            .from(from.parse().context("Invalid sender address")?)
            .to(email
                .to_email
                .parse()
                .context("Invalid recipient address")?)
            .subject(&email.subject)
            .header(content_type_for(&email.body))
            .body(email.body.clone())
            .context("Failed to build message")?;

        transport
            .send(message)
            .await
            .context("SMTP send failed")?;

        Ok(format!("Email sent to {}", email.to_email))
    }

    async fn send_sendgrid(
        &self,
        http: &reqwest::Client,
        api_key: &str,
        email: &OutboundEmail,
    ) -> Result<String> {
        let from_email = email.from_email.as_deref().unwrap_or(&self.from_email);
        let mut from = json!({ "email": from_email });
        if let Some(name) = &self.from_name {
            from["name"] = json!(name);
        }

        let mime_type = if is_html(&email.body) {
            "text/html"
        } else {
            "text/plain"
        };

        let payload = json!({
            "personalizations": [{ "to": [{ "email": email.to_email }] }],
            "from": from,
            "subject": email.subject,
            "content": [{ "type": mime_type, "value": email.body }],
        });

        let response = http
            .post(SENDGRID_SEND_URL)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .context("SendGrid request failed")?;

        let status = response.status();
        if status.is_success() {
            Ok(format!("Email accepted by SendGrid ({status})"))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!("SendGrid returned {status}: {body}"))
        }
    }

    fn format_from(&self, email: &OutboundEmail) -> String {
        let address = email.from_email.as_deref().unwrap_or(&self.from_email);
        match &self.from_name {
            Some(name) => format!("{name} <{address}>"),
            None => address.to_string(),
        }
    }
}

/// Batch loop shared by all transports: strict input order, pacing sleep
/// between consecutive sends only, `batch_index` stamped on each outcome.
async fn run_batch<F, Fut>(
    emails: &[OutboundEmail],
    delay: Duration,
    send_one: F,
) -> Vec<SendOutcome>
where
    F: Fn(OutboundEmail) -> Fut,
    Fut: std::future::Future<Output = SendOutcome>,
{
    let mut outcomes = Vec::with_capacity(emails.len());

    for (i, email) in emails.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        let mut outcome = send_one(email.clone()).await;
        outcome.batch_index = Some(i);
        outcomes.push(outcome);
    }

    outcomes
}

fn is_html(body: &str) -> bool {
    body.contains('<') && body.contains('>')
}

fn content_type_for(body: &str) -> ContentType {
    if is_html(body) {
        ContentType::TEXT_HTML
    } else {
        ContentType::TEXT_PLAIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbound(to: &str, contact_id: Option<i64>) -> OutboundEmail {
        OutboundEmail {
            to_email: to.to_string(),
            subject: "Quick question".to_string(),
            body: "Hi there".to_string(),
            from_email: None,
            contact_id,
            company_id: contact_id.map(|id| id * 10),
        }
    }

    /// Send stub that rejects one recipient and succeeds for the rest.
    fn stub_outcome(email: &OutboundEmail, failing: &str) -> SendOutcome {
        let success = email.to_email != failing;
        SendOutcome {
            success,
            method: "smtp",
            message: success.then(|| "ok".to_string()),
            error: (!success).then(|| "mailbox unavailable".to_string()),
            to_email: email.to_email.clone(),
            subject: email.subject.clone(),
            sent_at: Utc::now(),
            batch_index: None,
            contact_id: email.contact_id,
            company_id: email.company_id,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_isolates_one_failure() {
        let emails = vec![
            outbound("a@acme.io", Some(1)),
            outbound("b@acme.io", Some(2)),
            outbound("c@acme.io", Some(3)),
        ];

        let outcomes = run_batch(&emails, Duration::from_millis(2000), |email| async move {
            stub_outcome(&email, "b@acme.io")
        })
        .await;

        // One outcome per item, in input order.
        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes.iter().map(|o| o.batch_index).collect::<Vec<_>>(),
            vec![Some(0), Some(1), Some(2)]
        );
        // The middle failure did not stop the rest of the batch.
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].error.as_deref(), Some("mailbox unavailable"));
        assert!(outcomes[2].success);
        // Correlation ids echoed unchanged.
        assert_eq!(outcomes[2].contact_id, Some(3));
        assert_eq!(outcomes[2].company_id, Some(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_sleeps_between_sends_but_not_after_last() {
        let emails = vec![
            outbound("a@acme.io", None),
            outbound("b@acme.io", None),
            outbound("c@acme.io", None),
        ];

        let start = tokio::time::Instant::now();
        let outcomes = run_batch(&emails, Duration::from_millis(2000), |email| async move {
            stub_outcome(&email, "")
        })
        .await;

        // Two gaps for three sends; no trailing sleep.
        assert_eq!(outcomes.len(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_item_batch_never_sleeps() {
        let emails = vec![outbound("a@acme.io", None)];

        let start = tokio::time::Instant::now();
        let outcomes = run_batch(&emails, Duration::from_millis(2000), |email| async move {
            stub_outcome(&email, "")
        })
        .await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_html_detection() {
        assert!(is_html("<p>Hello</p>"));
        assert!(!is_html("Hi Sarah,\n\nplain text body"));
        // Both brackets are required; a lone comparison sign is not markup.
        assert!(!is_html("revenue < costs"));
    }

    #[test]
    fn test_from_line_includes_display_name() {
        let mailer = Mailer {
            transport: Transport::SendGrid {
                http: reqwest::Client::new(),
                api_key: "k".to_string(),
            },
            from_email: "outreach@example.com".to_string(),
            from_name: Some("Outreach Team".to_string()),
        };
        let email = OutboundEmail {
            to_email: "a@b.co".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            from_email: None,
            contact_id: None,
            company_id: None,
        };
        assert_eq!(mailer.format_from(&email), "Outreach Team <outreach@example.com>");
    }

    #[test]
    fn test_per_send_from_override() {
        let mailer = Mailer {
            transport: Transport::SendGrid {
                http: reqwest::Client::new(),
                api_key: "k".to_string(),
            },
            from_email: "outreach@example.com".to_string(),
            from_name: None,
        };
        let email = OutboundEmail {
            to_email: "a@b.co".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            from_email: Some("special@example.com".to_string()),
            contact_id: None,
            company_id: None,
        };
        assert_eq!(mailer.format_from(&email), "special@example.com");
    }

    #[tokio::test]
    async fn test_sendgrid_key_shape_check() {
        let mailer = Mailer {
            transport: Transport::SendGrid {
                http: reqwest::Client::new(),
                api_key: "SG.aaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            },
            from_email: "outreach@example.com".to_string(),
            from_name: None,
        };
        assert!(mailer.test_connection().await.is_ok());

        let mailer = Mailer {
            transport: Transport::SendGrid {
                http: reqwest::Client::new(),
                api_key: "short".to_string(),
            },
            from_email: "outreach@example.com".to_string(),
            from_name: None,
        };
        assert!(mailer.test_connection().await.is_err());
    }
}
