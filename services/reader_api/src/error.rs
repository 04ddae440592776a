//! services/reader_api/src/error.rs
//!
//! Defines the primary error type for the reader service.

use crate::config::ConfigError;
use quran_reader_core::ports::PortError;

/// The primary error type for the `reader_api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An error that propagated up from one of the core ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("WebSocket Error: {0}")]
    Websocket(#[from] axum::Error),

    /// A standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
