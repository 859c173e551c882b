pub mod reader;
pub mod tsdb;
