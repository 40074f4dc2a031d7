//! instance-counter Library
//!
//! A small web service that reports which instance served a request and
//! keeps a view counter shared by all instances in Redis. Exposed as a
//! library for integration tests.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use adapters::inbound::{HttpServer, HttpState};
pub use adapters::outbound::{MemoryCounterStore, RedisCounterStore};
pub use application::{CounterError, CounterService};
pub use config::{load_config, Config, StoreConfig};
pub use domain::entities::{InstanceInfo, Page, COUNTER_KEY};
pub use domain::ports::{CounterStore, StoreConnection, StoreError};
pub use infrastructure::{PageRenderer, ProcessExit, ShutdownController};
