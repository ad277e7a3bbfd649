pub mod app;
pub mod client;
pub mod common;
pub mod config;
pub mod docs;
pub mod fallback;
pub mod infrastructure;
pub mod middleware;
pub mod modules;
pub mod providers;
pub mod routes;
pub mod state;
pub mod workers;
