//! Counter Store Port
//!
//! Defines the interface for reading and writing the shared counter.
//! Implementations may use Redis or in-memory storage.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Errors raised by a counter store during a get or set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or the command failed in transit.
    #[error("store transport error: {0}")]
    Transport(String),
    /// The store did not answer within the configured timeout.
    #[error("store operation timed out after {0} ms")]
    Timeout(u64),
    /// The stored value is not an unsigned integer.
    #[error("value under {key} is not an unsigned integer: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Store holding named integer values.
///
/// This is an outbound port that abstracts the external key-value service.
/// Operations are independent: there is no transaction and no
/// compare-and-swap, so concurrent read-modify-write sequences may race.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a key. Returns `None` when the key does not exist.
    async fn get_integer(&self, key: &str) -> Result<Option<u64>, StoreError>;

    /// Write a key unconditionally, with no expiration.
    async fn set_integer(&self, key: &str, value: u64) -> Result<(), StoreError>;
}

/// Availability of the counter store, decided once at startup.
///
/// A store that fails its initial liveness check stays `Unavailable` for
/// the lifetime of the process; there is no reconnection.
#[derive(Clone)]
pub enum StoreConnection {
    Connected(Arc<dyn CounterStore>),
    Unavailable,
}

impl StoreConnection {
    /// Wrap a live store.
    pub fn connected(store: Arc<dyn CounterStore>) -> Self {
        Self::Connected(store)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Label used in logs and the health endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Debug for StoreConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreConnection::{}", self.as_str())
    }
}
