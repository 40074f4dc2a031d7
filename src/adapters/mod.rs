//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP); outbound adapters
//! implement the domain ports (Redis, in-memory).

pub mod inbound;
pub mod outbound;
