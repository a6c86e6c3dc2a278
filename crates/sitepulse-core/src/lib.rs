pub mod aggregate;
pub mod analytics;
pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod segment;
pub mod site;
pub mod window;
