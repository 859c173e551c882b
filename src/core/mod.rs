//! Outbound clients and infrastructure adapters.

pub mod client;
