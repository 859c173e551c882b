//! Translation between OpenTSDB-style queries and asset metric reads.

pub mod dto;
pub mod service;
