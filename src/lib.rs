pub mod bridge;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod selector;
