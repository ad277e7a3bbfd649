pub mod analytics;
pub mod billing;
pub mod generation;
pub mod health;
