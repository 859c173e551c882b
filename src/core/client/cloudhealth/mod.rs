//! Client for the upstream cloud metrics API.

pub mod ch_client;
pub mod ch_response;

pub use ch_client::CloudHealthClient;
