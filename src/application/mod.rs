//! Application Layer
//!
//! Use cases that orchestrate the domain ports.

mod counter_service;

pub use counter_service::{CounterError, CounterService};
