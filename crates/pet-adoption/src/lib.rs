pub mod access;
pub mod cache;
pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod workflows;
