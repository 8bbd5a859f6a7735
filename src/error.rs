//! Error types for update-transport
//!
//! Errors fall into four groups:
//! - Configuration errors raised while building a client (trust pool, client
//!   credential, invalid settings). No client is produced.
//! - Transport errors raised by a single request (connection, TLS handshake, timeout).
//! - Protocol errors raised while interpreting an update-check response.
//! - Payload errors raised by the download guard.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for update-transport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for update-transport
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "min_image_size")
        key: Option<String>,
    },

    /// The trusted server certificate file could not be turned into a trust pool
    #[error("failed to build server trust pool from {}: {reason}", path.display())]
    TrustPool {
        /// Path of the server certificate file
        path: PathBuf,
        /// Why no usable certificate was found
        reason: String,
    },

    /// The client certificate and key could not be loaded as a matching pair
    #[error("failed to load client certificate {} and key {}: {reason}", cert.display(), key.display())]
    CredentialLoad {
        /// Path of the client certificate
        cert: PathBuf,
        /// Path of the client private key
        key: PathBuf,
        /// What went wrong while loading or pairing
        reason: String,
    },

    /// The HTTP client could not be constructed from the loaded TLS material
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request URL could not be parsed
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// Network, connection or TLS handshake failure while sending a request
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// I/O error (reading a response body, reading trust files, writing a payload)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The update response body is not syntactically valid JSON
    #[error("malformed update response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// The update response is valid JSON but does not have the expected shape
    #[error("failed to decode update response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The update response decoded but is missing required fields
    #[error("incomplete update response: missing {}", missing.join(", "))]
    IncompleteResponse {
        /// Wire names of the empty or absent fields
        missing: Vec<&'static str>,
    },

    /// The server refused to schedule an update for this client (HTTP 404)
    #[error("client not authorized to get update schedule")]
    Unauthorized,

    /// The server answered with a status code outside the update protocol
    #[error("unexpected response status from server: {0}")]
    UnexpectedStatus(u16),

    /// The image response did not declare a content length
    #[error("will not continue with unknown image size")]
    UnknownSize,

    /// The image response declared a length below the plausibility threshold
    #[error("image of {length} bytes is smaller than the {minimum} byte minimum, aborting")]
    ImplausiblySmall {
        /// Declared content length in bytes
        length: u64,
        /// Configured minimum image size in bytes
        minimum: u64,
    },

    /// The downloaded image does not hash to the advertised checksum
    #[error("image checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksum advertised by the update descriptor
        expected: String,
        /// SHA-256 of the received bytes, lowercase hex
        actual: String,
    },
}

impl Error {
    /// Returns true for errors raised while constructing a client.
    ///
    /// These are fatal: the caller must fix the configuration rather than retry.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::TrustPool { .. }
                | Error::CredentialLoad { .. }
                | Error::ClientBuild(_)
        )
    }
}
