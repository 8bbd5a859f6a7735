//! Retry classification for update-transport errors
//!
//! Clients perform exactly one attempt per call. This module only tells the
//! caller whether another attempt could succeed; scheduling and backoff belong
//! to the caller.
//!
//! # Example
//!
//! ```no_run
//! use update_transport::retry::IsRetryable;
//! use update_transport::{Updater, UpdaterConfig, new_updater};
//!
//! # async fn example() -> Result<(), update_transport::Error> {
//! let updater = new_updater(&UpdaterConfig::default()).await?;
//! match updater.check_for_update("https://updates.example.com/api/update").await {
//!     Ok(outcome) => println!("{:?}", outcome),
//!     Err(e) if e.is_retryable() => println!("try again later: {}", e),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::Error;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, server errors, connection reset) should return `true`.
/// Permanent failures (bad configuration, unauthorized client, corrupt data) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation could be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Timeouts and refused connections usually clear up on their own
            Error::Transport(e) => e.is_timeout() || e.is_connect(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            // Server-side failures may be temporary, other statuses are not
            Error::UnexpectedStatus(code) => (500..600).contains(code),
            // Configuration errors need user action
            Error::Config { .. }
            | Error::TrustPool { .. }
            | Error::CredentialLoad { .. }
            | Error::ClientBuild(_)
            | Error::InvalidUrl { .. } => false,
            // The server said something definite; asking again gives the same answer
            Error::MalformedResponse(_)
            | Error::Decode(_)
            | Error::IncompleteResponse { .. }
            | Error::Unauthorized => false,
            // A truncated or tampered image may download fine on the next attempt
            Error::ChecksumMismatch { .. } => true,
            Error::UnknownSize | Error::ImplausiblySmall { .. } => false,
        }
    }
}
