//! Counter Service - Main application use case
//!
//! Owns the read-increment-write protocol against the shared store and the
//! degraded path used when the store was unreachable at startup.

use crate::domain::entities::COUNTER_KEY;
use crate::domain::ports::{StoreConnection, StoreError};

/// Failure of a counter operation. Aborts the current request only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CounterError {
    #[error("counter store failed: {0}")]
    Store(#[from] StoreError),
}

/// Counter service - main application use case.
///
/// Increments are a plain get followed by a set. Two instances that read
/// the same value will both write value + 1 and one view is lost; the store
/// offers no compare-and-swap here and none is attempted.
pub struct CounterService {
    connection: StoreConnection,
}

impl CounterService {
    /// Create a counter service over a store connection decided at startup.
    pub fn new(connection: StoreConnection) -> Self {
        Self { connection }
    }

    /// True when the counter is disabled because the store was unreachable.
    pub fn is_degraded(&self) -> bool {
        !self.connection.is_connected()
    }

    pub fn connection(&self) -> &StoreConnection {
        &self.connection
    }

    /// Increment the shared counter and return the new value.
    ///
    /// Returns `0` without touching anything when the store is unavailable.
    /// A failed read or write is returned to the caller; the stored value
    /// is left as it was.
    pub async fn current_incremented_value(&self) -> Result<u64, CounterError> {
        let store = match &self.connection {
            StoreConnection::Connected(store) => store,
            StoreConnection::Unavailable => return Ok(0),
        };

        let next = match store.get_integer(COUNTER_KEY).await? {
            Some(current) => current.saturating_add(1),
            None => 1,
        };

        if let Err(e) = store.set_integer(COUNTER_KEY, next).await {
            tracing::error!("failed to write {}={}: {}", COUNTER_KEY, next, e);
            return Err(e.into());
        }

        tracing::debug!("{} is now {}", COUNTER_KEY, next);
        Ok(next)
    }

    /// Set the shared counter back to zero. No-op when the store is unavailable.
    pub async fn reset(&self) -> Result<(), CounterError> {
        match &self.connection {
            StoreConnection::Connected(store) => {
                store.set_integer(COUNTER_KEY, 0).await?;
                tracing::info!("{} reset to 0", COUNTER_KEY);
                Ok(())
            }
            StoreConnection::Unavailable => Ok(()),
        }
    }
}
