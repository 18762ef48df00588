//! Mail adapter for development setups without a provider.

use async_trait::async_trait;
use tracing::info;

use super::templates::render;
use crate::domain::ports::{DeliveryStatus, MailDeliveryError, MailMessage, MailSender};

/// Renders each message and logs it instead of delivering it.
///
/// The activation link appears in the log, which is what a developer needs
/// to finish a registration locally.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMailSender;

#[async_trait]
impl MailSender for LoggingMailSender {
    async fn send(&self, message: &MailMessage) -> Result<DeliveryStatus, MailDeliveryError> {
        let rendered = render(message.template, &message.vars)?;
        info!(
            template = message.template.name(),
            recipient = %message.recipient_address,
            subject = %rendered.subject,
            vars = ?message.vars,
            "mail not delivered; no provider configured"
        );
        Ok(DeliveryStatus::Sandboxed)
    }
}
