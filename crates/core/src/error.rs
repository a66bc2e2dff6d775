//! Error types for the vaxwatch domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all vaxwatch operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Booking platform errors ---
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    // --- Notification errors ---
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the booking platform.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {status_code} from {url}")]
    Status { status_code: u16, url: String },

    #[error("Malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("Invalid center reference: {0}")]
    InvalidCenter(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    #[error("Notification delivery failed via {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}
