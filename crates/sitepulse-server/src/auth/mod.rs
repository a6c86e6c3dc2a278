pub mod jwt;
pub mod middleware;

pub use middleware::{require_auth, AuthContext};
