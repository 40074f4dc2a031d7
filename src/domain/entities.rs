//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the counter domain.
//! They have no external dependencies beyond serialization.

use serde::Serialize;

/// Key under which the shared page counter lives in the store.
pub const COUNTER_KEY: &str = "PageCount";

/// Identity of the process instance serving a request.
///
/// Sourced from the platform environment at startup and never persisted.
/// Missing variables are kept as empty strings so the page still renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceInfo {
    /// Instance IP address (`CF_INSTANCE_IP`)
    pub ip: String,
    /// Instance port (`CF_INSTANCE_PORT`)
    pub port: String,
    /// Instance index within the application (`CF_INSTANCE_INDEX`)
    pub index: String,
}

impl InstanceInfo {
    /// Create instance info from explicit values.
    pub fn new(ip: impl Into<String>, port: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port: port.into(),
            index: index.into(),
        }
    }

    /// Read instance identity from the process environment.
    pub fn from_env() -> Self {
        Self {
            ip: std::env::var("CF_INSTANCE_IP").unwrap_or_default(),
            port: std::env::var("CF_INSTANCE_PORT").unwrap_or_default(),
            index: std::env::var("CF_INSTANCE_INDEX").unwrap_or_default(),
        }
    }
}

/// Everything the hello page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub instance: InstanceInfo,
    pub page_count: u64,
}

impl Page {
    pub fn new(instance: InstanceInfo, page_count: u64) -> Self {
        Self {
            instance,
            page_count,
        }
    }

    /// Whether the counter section of the page should be shown.
    pub fn show_count(&self) -> bool {
        self.page_count > 0
    }
}
