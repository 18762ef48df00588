//! Outbound mail adapters.
//!
//! [`HttpMailSender`] delivers through a provider API; [`LoggingMailSender`]
//! stands in when no provider is configured.

mod http_sender;
mod logging_sender;
mod templates;

pub use http_sender::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_BACKOFF, HttpMailConfig,
    HttpMailSender,
};
pub use logging_sender::LoggingMailSender;
pub use templates::{RenderedMail, render};
