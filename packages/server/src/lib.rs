//! Cook card extraction API server.

pub mod app;
pub mod config;
pub mod routes;

pub use app::{build_app, build_ladder, AppState};
pub use config::Config;
