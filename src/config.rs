//! Configuration
//!
//! Service settings from the process environment. The counter store comes
//! from the platform's `VCAP_SERVICES` binding, falling back to explicit
//! `COUNTER_STORE_*` variables.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Connection settings for the counter store.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub timeout_ms: u64,
}

impl StoreConfig {
    /// `host:port` form, for logging.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub template_path: String,
    pub debug: bool,

    // Counter store binding; None runs with the counter disabled
    pub store: Option<StoreConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            template_path: "templates/hello.html".to_string(),
            debug: false,
            store: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("VCAP_SERVICES is not valid JSON: {0}")]
    InvalidVcap(String),
    #[error("redis binding is missing credential {0}")]
    MissingCredential(&'static str),
    #[error("redis binding has invalid port {0:?}")]
    InvalidPort(String),
    #[error("PORT is not a valid port number: {0:?}")]
    InvalidListenPort(String),
}

/// One entry of a `VCAP_SERVICES` service list.
#[derive(Debug, Deserialize)]
struct ServiceBinding {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    credentials: HashMap<String, serde_json::Value>,
}

const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;

/// Whether debug logging was requested. Read before `load_config` so the
/// subscriber is installed before config loading logs anything.
pub fn debug_enabled() -> bool {
    std::env::var("DEBUG").is_ok()
}

pub fn load_config() -> anyhow::Result<Config> {
    // An unusable PORT is a listen failure, so it is fatal here too
    let port: u16 = match std::env::var("PORT") {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidListenPort(raw.clone()))?,
        Err(_) => 8080,
    };
    let listen_addr = format!("0.0.0.0:{}", port);

    let template_path = std::env::var("COUNTER_TEMPLATE_PATH")
        .unwrap_or_else(|_| "templates/hello.html".to_string());

    let debug = debug_enabled();

    let timeout_ms = std::env::var("COUNTER_STORE_TIMEOUT_MS")
        .unwrap_or_else(|_| DEFAULT_STORE_TIMEOUT_MS.to_string())
        .parse()
        .unwrap_or(DEFAULT_STORE_TIMEOUT_MS);

    // Platform binding wins over explicit variables
    let store = match std::env::var("VCAP_SERVICES") {
        Ok(raw) => match store_from_vcap(&raw, timeout_ms) {
            Ok(Some(store)) => Some(store),
            Ok(None) => store_from_env(timeout_ms),
            Err(e) => {
                tracing::warn!("ignoring redis service binding: {}", e);
                store_from_env(timeout_ms)
            }
        },
        Err(_) => store_from_env(timeout_ms),
    };

    Ok(Config {
        listen_addr,
        template_path,
        debug,
        store,
    })
}

/// Find the first service tagged `redis` in a `VCAP_SERVICES` document.
///
/// Returns `Ok(None)` when no such service is bound.
pub fn store_from_vcap(raw: &str, timeout_ms: u64) -> Result<Option<StoreConfig>, ConfigError> {
    let services: HashMap<String, Vec<ServiceBinding>> =
        serde_json::from_str(raw).map_err(|e| ConfigError::InvalidVcap(e.to_string()))?;

    // HashMap order is arbitrary; sort labels so the pick is stable
    let mut labels: Vec<&String> = services.keys().collect();
    labels.sort();

    let binding = labels
        .into_iter()
        .flat_map(|label| services[label].iter())
        .find(|s| s.tags.iter().any(|t| t == "redis"));

    let Some(binding) = binding else {
        return Ok(None);
    };
    let creds = &binding.credentials;

    let host = creds
        .get("hostname")
        .or_else(|| creds.get("host"))
        .and_then(|v| v.as_str())
        .ok_or(ConfigError::MissingCredential("hostname"))?
        .to_string();

    let port = match creds.get("port") {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| ConfigError::InvalidPort(n.to_string()))?,
        Some(serde_json::Value::String(s)) => s
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(s.clone()))?,
        Some(other) => return Err(ConfigError::InvalidPort(other.to_string())),
        None => return Err(ConfigError::MissingCredential("port")),
    };

    let password = creds
        .get("password")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok(Some(StoreConfig {
        host,
        port,
        password,
        timeout_ms,
    }))
}

fn store_from_env(timeout_ms: u64) -> Option<StoreConfig> {
    let host = std::env::var("COUNTER_STORE_HOST").ok()?;
    let port = std::env::var("COUNTER_STORE_PORT")
        .unwrap_or_else(|_| "6379".to_string())
        .parse()
        .unwrap_or(6379);
    let password = std::env::var("COUNTER_STORE_PASSWORD").ok();

    Some(StoreConfig {
        host,
        port,
        password,
        timeout_ms,
    })
}
