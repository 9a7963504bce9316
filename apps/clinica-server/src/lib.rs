//! Clinic backend server: configuration, logging and the HTTP stack.

pub mod config;
pub mod logging;
pub mod server;
mod shutdown;

pub use config::AppConfig;
pub use server::{AppServices, build_router, run};
