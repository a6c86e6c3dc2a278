pub mod app;
pub mod auth;
pub mod error;
pub mod metadata;
pub mod routes;
pub mod seed;
pub mod state;
pub mod ua;
