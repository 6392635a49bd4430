//! Core library for the WiFi analyzer.
//! This crate holds the scan/analysis engine (signal classification, the
//! access point record store, the channel histogram and the presence
//! tracker), the traits its radio collaborators implement, backend
//! implementations selected by feature flags, and the web server that
//! exposes it all to the dashboard.

pub mod backends;
pub mod config;
pub mod diagnostics;
pub mod frame;
pub mod frontends;
pub mod histogram;
pub mod mac;
pub mod presence;
pub mod records;
pub mod scan;
pub mod signal;
pub mod traits;
pub mod web_server;

// Define a shared Error and Result type for the entire crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Web server error: {0}")]
    WebServer(#[from] axum::BoxError),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid hardware address: {0}")]
    InvalidMacAddress(String),
}

/// A specialized `Result` type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;
