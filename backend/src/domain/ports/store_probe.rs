//! Port for record store reachability checks.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failure reported by a reachability check.
    pub enum StoreProbeError {
        /// The store could not be reached.
        Unreachable { message: String } => "record store unreachable: {message}",
    }
}

/// Cheap liveness check against the backing record store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreProbe: Send + Sync {
    /// Succeed when the store answers a trivial request.
    async fn ping(&self) -> Result<(), StoreProbeError>;
}
