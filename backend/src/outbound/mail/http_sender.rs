//! Reqwest-backed mail provider adapter.
//!
//! Posts a JSON message to a transactional mail API. Transport failures and
//! 5xx/429 responses are retried a bounded number of times; other 4xx
//! responses are final.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::templates::{RenderedMail, render};
use crate::domain::Email;
use crate::domain::ports::{DeliveryStatus, MailDeliveryError, MailMessage, MailSender};

/// Attempts made before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Base delay between attempts; the n-th retry waits `n` times this.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);
/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sender identity and provider endpoint.
pub struct HttpMailConfig {
    /// Provider endpoint accepting the JSON payload.
    pub endpoint: Url,
    /// Bearer credential for the provider.
    pub api_key: Zeroizing<String>,
    /// Envelope sender address.
    pub from_address: Email,
    /// Envelope sender display name.
    pub from_name: String,
    /// Attempts before giving up (at least one).
    pub max_attempts: u32,
    /// Base delay between attempts.
    pub retry_backoff: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl HttpMailConfig {
    /// Configuration with default retry and timeout settings.
    pub fn new(
        endpoint: Url,
        api_key: impl Into<String>,
        from_address: Email,
        from_name: impl Into<String>,
    ) -> Self {
        Self {
            endpoint,
            api_key: Zeroizing::new(api_key.into()),
            from_address,
            from_name: from_name.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Mail adapter that talks to an HTTP provider.
pub struct HttpMailSender {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
    from_address: Email,
    from_name: String,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl HttpMailSender {
    /// Build the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: HttpMailConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key: config.api_key,
            from_address: config.from_address,
            from_name: config.from_name,
            max_attempts: config.max_attempts.max(1),
            retry_backoff: config.retry_backoff,
        })
    }

    async fn attempt(&self, payload: &MailPayload<'_>) -> Result<(), Attempt> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(payload)
            .send()
            .await
            .map_err(|err| Attempt::Retryable(MailDeliveryError::transport(err.to_string())))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }
}

/// Outcome of a failed attempt.
#[derive(Debug)]
enum Attempt {
    Retryable(MailDeliveryError),
    Final(MailDeliveryError),
}

fn classify_status(status: StatusCode, body: &str) -> Attempt {
    let error = MailDeliveryError::rejected(status.as_u16(), body_preview(body));
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Attempt::Retryable(error)
    } else {
        Attempt::Final(error)
    }
}

fn body_preview(body: &str) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct MailPayload<'a> {
    from: Address<'a>,
    to: [Address<'a>; 1],
    subject: &'a str,
    html: &'a str,
    template: &'a str,
    sandbox: bool,
}

fn payload<'a>(
    sender: &'a HttpMailSender,
    message: &'a MailMessage,
    rendered: &'a RenderedMail,
) -> MailPayload<'a> {
    MailPayload {
        from: Address {
            email: sender.from_address.as_ref(),
            name: sender.from_name.as_str(),
        },
        to: [Address {
            email: message.recipient_address.as_ref(),
            name: message.recipient_name.as_str(),
        }],
        subject: rendered.subject.as_str(),
        html: rendered.html.as_str(),
        template: message.template.name(),
        sandbox: message.sandbox,
    }
}

#[async_trait]
impl MailSender for HttpMailSender {
    async fn send(&self, message: &MailMessage) -> Result<DeliveryStatus, MailDeliveryError> {
        let rendered = render(message.template, &message.vars)?;
        let body = payload(self, message, &rendered);

        let mut attempt = 1;
        loop {
            match self.attempt(&body).await {
                Ok(()) => {
                    debug!(
                        template = message.template.name(),
                        attempts = attempt,
                        sandbox = message.sandbox,
                        "mail accepted"
                    );
                    return Ok(if message.sandbox {
                        DeliveryStatus::Sandboxed
                    } else {
                        DeliveryStatus::Delivered { attempts: attempt }
                    });
                }
                Err(Attempt::Final(err)) => return Err(err),
                Err(Attempt::Retryable(err)) if attempt >= self.max_attempts => return Err(err),
                Err(Attempt::Retryable(err)) => {
                    warn!(attempt, error = %err, "mail delivery failed; retrying");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MailTemplate;
    use rstest::rstest;
    use std::collections::BTreeMap;

    #[rstest]
    #[case::server_error(StatusCode::BAD_GATEWAY, true)]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case::bad_request(StatusCode::BAD_REQUEST, false)]
    #[case::unauthorised(StatusCode::UNAUTHORIZED, false)]
    fn statuses_are_classified(#[case] status: StatusCode, #[case] retryable: bool) {
        let outcome = classify_status(status, "nope");
        assert_eq!(matches!(outcome, Attempt::Retryable(_)), retryable);
    }

    #[rstest]
    fn rejections_carry_status_and_preview() {
        let Attempt::Final(err) =
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, " bad \n  address ")
        else {
            panic!("422 is final");
        };
        assert_eq!(err, MailDeliveryError::rejected(422_u16, "bad address"));
    }

    #[rstest]
    fn payload_carries_sandbox_flag_and_recipient() {
        let sender = HttpMailSender::new(HttpMailConfig::new(
            Url::parse("https://mail.test/send").expect("url"),
            "key",
            Email::new("noreply@social.test").expect("email"),
            "Social",
        ))
        .expect("client");
        let message = MailMessage {
            template: MailTemplate::UserInvitation,
            recipient_name: "ada".to_owned(),
            recipient_address: Email::new("ada@example.com").expect("email"),
            vars: BTreeMap::new(),
            sandbox: true,
        };
        let rendered = RenderedMail {
            subject: "s".to_owned(),
            html: "h".to_owned(),
        };

        let json = serde_json::to_value(payload(&sender, &message, &rendered)).expect("json");
        assert_eq!(json["sandbox"], true);
        assert_eq!(json["to"][0]["email"], "ada@example.com");
        assert_eq!(json["from"]["name"], "Social");
        assert_eq!(json["template"], "user_invitation");
    }
}
