pub mod analytics_impl;
pub mod backend;
pub mod schema;
pub mod settings;
pub mod site;

pub use backend::DuckDbBackend;

/// Re-export the `duckdb` crate so consumers (especially tests) can use
/// `sitepulse_duckdb::duckdb::params!` without an extra dependency.
pub use duckdb;
