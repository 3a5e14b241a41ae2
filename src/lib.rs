pub mod config;
pub mod engine;
pub mod insights;
pub mod records;
pub mod report;
pub mod server;
pub mod store;
