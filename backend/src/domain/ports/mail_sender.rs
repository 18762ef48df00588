//! Port for outbound transactional mail.
use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::Email;

use super::define_port_error;

define_port_error! {
    /// Delivery failures reported by mail adapters.
    pub enum MailDeliveryError {
        /// The provider could not be reached or timed out.
        Transport { message: String } => "mail transport failed: {message}",
        /// The provider refused the message.
        Rejected { status: u16, message: String } => "mail rejected with status {status}: {message}",
        /// The template could not be rendered.
        Template { message: String } => "mail template failed: {message}",
    }
}

/// Templates known to the mail adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
    /// Welcome message carrying the activation link.
    UserInvitation,
}

impl MailTemplate {
    /// Stable template name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserInvitation => "user_invitation",
        }
    }
}

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Template to render.
    pub template: MailTemplate,
    /// Display name of the recipient.
    pub recipient_name: String,
    /// Recipient address.
    pub recipient_address: Email,
    /// Template variables.
    pub vars: BTreeMap<String, String>,
    /// Ask the provider to validate without delivering.
    pub sandbox: bool,
}

/// Successful outcome of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Accepted by the provider after `attempts` tries.
    Delivered {
        /// Number of attempts used.
        attempts: u32,
    },
    /// Accepted in sandbox mode; nothing was delivered.
    Sandboxed,
}

/// Outbound mail collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Render and deliver `message`.
    async fn send(&self, message: &MailMessage) -> Result<DeliveryStatus, MailDeliveryError>;
}
