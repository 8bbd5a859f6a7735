//! # update-transport
//!
//! Secure transport and update-check layer for device-side update agents.
//!
//! ## Design Philosophy
//!
//! update-transport is designed to be:
//! - **Secure by configuration** - Mutual TLS from three PEM paths, with loud
//!   warnings whenever trust material is missing
//! - **Strict about the protocol** - Every server answer maps to exactly one
//!   typed outcome or error
//! - **Single-shot** - One request per call, no hidden retries; errors say
//!   whether retrying makes sense
//! - **Library-first** - No CLI, no global logger, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use update_transport::{CheckOutcome, UpdaterConfig, new_updater};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Empty trust configuration: plain client
//!     let updater = new_updater(&UpdaterConfig::default()).await?;
//!
//!     match updater.check_for_update("http://updates.local/api/update").await? {
//!         CheckOutcome::UpdateAvailable(update) => {
//!             let image = updater.fetch_update(&update.image.uri).await?;
//!             println!("Downloading {} bytes", image.length());
//!         }
//!         CheckOutcome::NoUpdate => println!("Up to date"),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Retry classification
pub mod retry;
/// Transport construction and request execution
pub mod transport;
/// Core types exchanged with the update server
pub mod types;
/// Update clients
pub mod updater;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{DEFAULT_MIN_IMAGE_SIZE, TrustConfig, UpdaterConfig};
pub use error::{Error, Result};
pub use retry::IsRetryable;
pub use transport::{BufferedResponse, ClientCredential, Credentials, RequestExecutor, TrustPool};
pub use types::{CheckOutcome, ImageInfo, UpdateDescriptor};
pub use updater::{
    HttpUpdater, HttpsUpdater, UpdateStream, Updater, UpdaterBuilder, new_updater,
};
