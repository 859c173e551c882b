pub mod tsdb_query_request;
pub mod tsdb_time_series;
