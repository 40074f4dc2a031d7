//! Integration tests for the Redis counter store
//!
//! Runs the adapter against a minimal in-process RESP2 server on an
//! ephemeral port, so no real Redis is needed.

use dashmap::DashMap;
use instance_counter::config::StoreConfig;
use instance_counter::{CounterService, RedisCounterStore, StoreError, COUNTER_KEY};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Tiny RESP2 server understanding PING, AUTH, CLIENT, GET and SET.
#[derive(Clone, Default)]
struct FakeRedis {
    values: Arc<DashMap<String, String>>,
    password: Option<String>,
    refuse_writes: Arc<AtomicBool>,
}

impl FakeRedis {
    fn with_password(password: &str) -> Self {
        Self {
            password: Some(password.to_string()),
            ..Default::default()
        }
    }

    async fn start(&self) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = self.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let server = server.clone();
                tokio::spawn(async move { server.handle(stream).await });
            }
        });
        port
    }

    async fn handle(&self, stream: TcpStream) {
        let (read, mut write) = stream.into_split();
        let mut reader = BufReader::new(read);
        let mut authed = self.password.is_none();

        while let Some(args) = read_command(&mut reader).await {
            let reply = self.execute(&args, &mut authed);
            if write.write_all(reply.as_bytes()).await.is_err() {
                return;
            }
        }
    }

    fn execute(&self, args: &[String], authed: &mut bool) -> String {
        let name = args.first().map(|s| s.to_uppercase()).unwrap_or_default();
        if name == "AUTH" {
            let given = args.last().cloned();
            return if given == self.password {
                *authed = true;
                "+OK\r\n".to_string()
            } else {
                "-WRONGPASS invalid password\r\n".to_string()
            };
        }
        if !*authed {
            return "-NOAUTH Authentication required.\r\n".to_string();
        }

        match (name.as_str(), args.len()) {
            ("PING", _) => "+PONG\r\n".to_string(),
            ("CLIENT", _) => "+OK\r\n".to_string(),
            ("GET", 2) => match self.values.get(&args[1]) {
                Some(v) => format!("${}\r\n{}\r\n", v.len(), v.as_str()),
                None => "$-1\r\n".to_string(),
            },
            ("SET", 3) => {
                if self.refuse_writes.load(Ordering::SeqCst) {
                    "-READONLY You can't write against a read only replica.\r\n".to_string()
                } else {
                    self.values.insert(args[1].clone(), args[2].clone());
                    "+OK\r\n".to_string()
                }
            }
            _ => format!("-ERR unknown command '{}'\r\n", name),
        }
    }

    fn value(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }
}

/// Read one `*N` array of bulk strings; None on EOF or malformed input.
async fn read_command<R>(reader: &mut BufReader<R>) -> Option<Vec<String>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(String::from_utf8(buf).ok()?);
    }
    Some(args)
}

fn store_config(port: u16, password: Option<&str>) -> StoreConfig {
    StoreConfig {
        host: "127.0.0.1".to_string(),
        port,
        password: password.map(str::to_string),
        timeout_ms: 1000,
    }
}

#[tokio::test]
async fn test_connect_and_ping() {
    let redis = FakeRedis::default();
    let port = redis.start().await;

    let conn = RedisCounterStore::connect(&store_config(port, None)).await;
    assert!(conn.is_connected());
}

#[tokio::test]
async fn test_connect_with_password() {
    let redis = FakeRedis::with_password("s3cret");
    let port = redis.start().await;

    let conn = RedisCounterStore::connect(&store_config(port, Some("s3cret"))).await;
    assert!(conn.is_connected());
}

#[tokio::test]
async fn test_wrong_password_is_unavailable() {
    let redis = FakeRedis::with_password("s3cret");
    let port = redis.start().await;

    let conn = RedisCounterStore::connect(&store_config(port, Some("guess"))).await;
    assert!(!conn.is_connected());
}

#[tokio::test]
async fn test_counter_scenario_against_redis() {
    let redis = FakeRedis::default();
    let port = redis.start().await;
    let service = CounterService::new(RedisCounterStore::connect(&store_config(port, None)).await);

    assert_eq!(redis.value(COUNTER_KEY), None);
    assert_eq!(service.current_incremented_value().await.unwrap(), 1);
    assert_eq!(redis.value(COUNTER_KEY), Some("1".to_string()));
    assert_eq!(service.current_incremented_value().await.unwrap(), 2);
    assert_eq!(redis.value(COUNTER_KEY), Some("2".to_string()));

    service.reset().await.unwrap();
    assert_eq!(redis.value(COUNTER_KEY), Some("0".to_string()));
    assert_eq!(service.current_incremented_value().await.unwrap(), 1);
}

#[tokio::test]
async fn test_counter_shared_between_instances() {
    let redis = FakeRedis::default();
    let port = redis.start().await;
    let first = CounterService::new(RedisCounterStore::connect(&store_config(port, None)).await);
    let second = CounterService::new(RedisCounterStore::connect(&store_config(port, None)).await);

    assert_eq!(first.current_incremented_value().await.unwrap(), 1);
    assert_eq!(second.current_incremented_value().await.unwrap(), 2);
    assert_eq!(first.current_incremented_value().await.unwrap(), 3);
}

#[tokio::test]
async fn test_refused_write_keeps_value_and_connection() {
    let redis = FakeRedis::default();
    let port = redis.start().await;
    let service = CounterService::new(RedisCounterStore::connect(&store_config(port, None)).await);

    assert_eq!(service.current_incremented_value().await.unwrap(), 1);

    redis.refuse_writes.store(true, Ordering::SeqCst);
    assert!(service.current_incremented_value().await.is_err());
    assert_eq!(redis.value(COUNTER_KEY), Some("1".to_string()));

    redis.refuse_writes.store(false, Ordering::SeqCst);
    assert!(!service.is_degraded());
    assert_eq!(service.current_incremented_value().await.unwrap(), 2);
}

#[tokio::test]
async fn test_non_numeric_value_is_invalid() {
    let redis = FakeRedis::default();
    let port = redis.start().await;
    redis.values.insert(COUNTER_KEY.to_string(), "lots".to_string());

    let service = CounterService::new(RedisCounterStore::connect(&store_config(port, None)).await);
    let err = service.current_incremented_value().await.unwrap_err();
    assert!(err.to_string().contains("not an unsigned integer"));
    assert!(matches!(
        err,
        instance_counter::CounterError::Store(StoreError::InvalidValue { .. })
    ));
    assert_eq!(redis.value(COUNTER_KEY), Some("lots".to_string()));
}
