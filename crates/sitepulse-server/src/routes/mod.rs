pub mod analytics;
pub mod health;
pub mod sites;
pub mod track;
