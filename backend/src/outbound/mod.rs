//! Outbound adapters implementing the domain's driven ports.
//!
//! - **persistence**: PostgreSQL repositories on Diesel
//! - **memory**: a single-process store for development and tests
//! - **mail**: provider and logging mail senders
//! - **token**: the JWT session token codec
//!
//! Adapters translate between domain types and infrastructure formats. They
//! hold no business rules.

pub mod mail;
pub mod memory;
pub mod persistence;
pub mod token;
