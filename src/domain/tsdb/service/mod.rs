pub mod tsdb_adapter_service;
pub mod tsdb_query_service;
