pub mod app;
pub mod client;
pub mod config;
pub mod function;
pub mod handler;
pub mod synthesis;
pub mod version;
