//! Redis Counter Store
//!
//! Implements CounterStore on top of a single multiplexed Redis connection.
//! The connection is opened and pinged once at startup; if that fails the
//! service runs with the counter disabled.

use crate::config::StoreConfig;
use crate::domain::ports::{CounterStore, StoreConnection, StoreError};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Redis-backed counter store.
///
/// `MultiplexedConnection` is cheap to clone and safe to share, so every
/// call works on its own handle without a client-side lock.
pub struct RedisCounterStore {
    conn: MultiplexedConnection,
    op_timeout: Duration,
}

impl RedisCounterStore {
    /// Connect to Redis and verify liveness with `PING`.
    ///
    /// Never fails: any problem is logged and reported as
    /// `StoreConnection::Unavailable`.
    pub async fn connect(config: &StoreConfig) -> StoreConnection {
        match Self::try_connect(config).await {
            Ok(store) => {
                tracing::info!("counter store connected at {}", config.addr());
                StoreConnection::connected(Arc::new(store))
            }
            Err(e) => {
                tracing::warn!(
                    "counter store unavailable at {}: {} (counter disabled)",
                    config.addr(),
                    e
                );
                StoreConnection::Unavailable
            }
        }
    }

    async fn try_connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let op_timeout = config.timeout();
        let client = redis::Client::open(connection_info(config))
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let conn = with_timeout(op_timeout, client.get_multiplexed_async_connection()).await?;
        let store = Self { conn, op_timeout };
        store.ping().await?;
        Ok(store)
    }

    /// Liveness check.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let reply: String = with_timeout(
            self.op_timeout,
            redis::cmd("PING").query_async::<_, String>(&mut conn),
        )
        .await?;

        if reply == "PONG" {
            Ok(())
        } else {
            Err(StoreError::Transport(format!("unexpected PING reply: {}", reply)))
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get_integer(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = with_timeout(self.op_timeout, conn.get(key)).await?;
        raw.map(|value| parse_counter(key, value)).transpose()
    }

    async fn set_integer(&self, key: &str, value: u64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        with_timeout(self.op_timeout, conn.set::<_, _, ()>(key, value)).await
    }
}

/// Build connection parameters from the store config (database 0).
fn connection_info(config: &StoreConfig) -> ConnectionInfo {
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
        redis: RedisConnectionInfo {
            db: 0,
            password: config.password.clone().filter(|p| !p.is_empty()),
            ..Default::default()
        },
    }
}

/// Parse a stored counter value.
fn parse_counter(key: &str, value: String) -> Result<u64, StoreError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| StoreError::InvalidValue {
            key: key.to_string(),
            value,
        })
}

/// Bound a Redis future by the operation timeout and map its error.
async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(StoreError::Transport(e.to_string())),
        Err(_) => Err(StoreError::Timeout(timeout.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn test_config(port: u16) -> StoreConfig {
        StoreConfig {
            host: "127.0.0.1".to_string(),
            port,
            password: Some("s3cret".to_string()),
            timeout_ms: 200,
        }
    }

    #[test]
    fn test_parse_counter_valid() {
        assert_eq!(parse_counter("PageCount", "42".to_string()), Ok(42));
        assert_eq!(parse_counter("PageCount", " 7 ".to_string()), Ok(7));
        assert_eq!(parse_counter("PageCount", "0".to_string()), Ok(0));
    }

    #[test]
    fn test_parse_counter_invalid() {
        let err = parse_counter("PageCount", "-1".to_string()).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidValue {
                key: "PageCount".to_string(),
                value: "-1".to_string(),
            }
        );
        assert!(parse_counter("PageCount", "abc".to_string()).is_err());
    }

    #[test]
    fn test_connection_info_with_password() {
        let info = connection_info(&test_config(6379));
        assert!(matches!(&info.addr, ConnectionAddr::Tcp(host, 6379) if host == "127.0.0.1"));
        assert_eq!(info.redis.db, 0);
        assert_eq!(info.redis.password, Some("s3cret".to_string()));
    }

    #[test]
    fn test_connection_info_empty_password_is_none() {
        let mut config = test_config(6379);
        config.password = Some(String::new());
        let info = connection_info(&config);
        assert_eq!(info.redis.password, None);
    }

    #[tokio::test]
    async fn test_with_timeout_maps_error() {
        let fut = async {
            Err::<(), _>(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "broken pipe",
            )))
        };
        let err = with_timeout(Duration::from_millis(100), fut).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let fut = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<(), redis::RedisError>(())
        };
        let err = with_timeout(Duration::from_millis(10), fut).await.unwrap_err();
        assert_eq!(err, StoreError::Timeout(10));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_connect_unreachable_is_unavailable() {
        // Bind then drop a listener to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let conn = RedisCounterStore::connect(&test_config(port)).await;
        assert!(!conn.is_connected());
        assert!(logs_contain("counter disabled"));
    }
}
