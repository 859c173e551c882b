// Upstream metrics API client
pub mod cloudhealth;
