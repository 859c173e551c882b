//! API route declarations (e.g., /api/*)

pub mod tsdb_routes;
