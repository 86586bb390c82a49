//! Error types for ecal-av
//!
//! Any failure here is fatal for the Aggregate & Visualize pipeline: no
//! partial aggregation is attempted after a failed fetch.

use thiserror::Error;

/// Main error type for the Aggregate & Visualize pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Measurement API answered with a non-success status
    #[error("Measurement API error {status}: {message}")]
    RemoteFetch { status: u16, message: String },

    /// Request could not be sent or the response could not be read
    #[error("Network error: {0}")]
    Network(String),

    /// Response body is not the expected measurement payload
    #[error("Decode error: {0}")]
    Decode(String),

    /// Chart could not be drawn or saved
    #[error("Chart error: {0}")]
    Chart(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ecal-common error
    #[error(transparent)]
    Common(#[from] ecal_common::Error),
}

/// Convenience Result type using ecal-av Error
pub type Result<T> = std::result::Result<T, Error>;
