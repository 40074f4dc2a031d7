//! Domain Layer
//!
//! Entities and outbound ports. No knowledge of Redis or HTTP.

pub mod entities;
pub mod ports;

pub use entities::{InstanceInfo, Page, COUNTER_KEY};
pub use ports::{CounterStore, StoreConnection, StoreError};
