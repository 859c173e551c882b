pub mod tsdb;
