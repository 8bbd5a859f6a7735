//! Update clients
//!
//! The core abstraction is the [`Updater`] trait, which checks a server for a
//! scheduled update and fetches image payloads. Two implementations exist:
//!
//! - [`HttpUpdater`]: plain transport, no TLS customization
//! - [`HttpsUpdater`]: wraps an [`HttpUpdater`] whose transport carries the
//!   loaded trust pool and client certificate
//!
//! [`UpdaterBuilder`] picks one of them once, based on whether any trust
//! material was configured.
//!
//! ## Usage
//!
//! ```no_run
//! use update_transport::{TrustConfig, UpdaterBuilder, UpdaterConfig, CheckOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UpdaterConfig {
//!         trust: TrustConfig::new(
//!             "/etc/update/device.crt",
//!             "/etc/update/device.key",
//!             "/etc/update/server.crt",
//!         ),
//!         ..Default::default()
//!     };
//!     let updater = UpdaterBuilder::new(config).build().await?;
//!
//!     if let CheckOutcome::UpdateAvailable(update) =
//!         updater.check_for_update("https://updates.example.com/api/update").await?
//!     {
//!         let image = updater.fetch_update(&update.image.uri).await?;
//!         let mut file = tokio::fs::File::create("/tmp/image").await?;
//!         image.copy_verified(&mut file, &update.image.checksum).await?;
//!     }
//!     Ok(())
//! }
//! ```

mod check;
mod download;

#[cfg(test)]
mod tests;

pub use check::{
    UPDATE_RESPONSE_ERROR, UPDATE_RESPONSE_HAVE_UPDATE, UPDATE_RESPONSE_NO_UPDATES,
    decode_descriptor, process_update_response,
};
pub use download::{UpdateStream, check_content_length};

use crate::config::UpdaterConfig;
use crate::error::{Error, Result};
use crate::transport::{
    Credentials, RequestExecutor, build_plain_transport, build_secure_transport, build_transport,
};
use crate::types::CheckOutcome;
use async_trait::async_trait;
use tracing::{Instrument, Span, debug};

/// Client-side update protocol
///
/// Every call performs exactly one request. Retrying is up to the caller, see
/// [`crate::retry::IsRetryable`].
#[async_trait]
pub trait Updater: Send + Sync {
    /// Ask the server at `url` whether an update is scheduled for this device
    ///
    /// # Errors
    ///
    /// Transport failures, unreadable bodies and every protocol error listed on
    /// [`process_update_response`].
    async fn check_for_update(&self, url: &str) -> Result<CheckOutcome>;

    /// Start downloading the image at `url`
    ///
    /// The returned stream belongs to the caller.
    ///
    /// # Errors
    ///
    /// Transport failures, or [`crate::Error::UnknownSize`] /
    /// [`crate::Error::ImplausiblySmall`] from the size guard.
    async fn fetch_update(&self, url: &str) -> Result<UpdateStream>;

    /// Whether this client was built with TLS trust material
    fn is_secure(&self) -> bool;
}

/// Update client over a transport without TLS customization
#[derive(Clone, Debug)]
pub struct HttpUpdater {
    executor: RequestExecutor,
    min_image_size: u64,
    span: Span,
}

impl HttpUpdater {
    /// Build a plain client from `config`, ignoring its trust section
    ///
    /// # Errors
    ///
    /// [`crate::Error::Config`] for invalid settings, [`crate::Error::ClientBuild`]
    /// if the transport cannot be created.
    pub fn new(config: &UpdaterConfig) -> Result<Self> {
        config.validate()?;
        let client = build_plain_transport(config)?;
        Ok(Self::with_transport(client, config.min_image_size))
    }

    pub(crate) fn with_transport(client: reqwest::Client, min_image_size: u64) -> Self {
        Self {
            executor: RequestExecutor::new(client),
            min_image_size,
            span: Span::none(),
        }
    }

    /// Emit every request event inside `span`
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Smallest image size accepted by [`Updater::fetch_update`]
    pub fn min_image_size(&self) -> u64 {
        self.min_image_size
    }
}

#[async_trait]
impl Updater for HttpUpdater {
    async fn check_for_update(&self, url: &str) -> Result<CheckOutcome> {
        async {
            // The body is buffered and dropped here on every path
            let response = self.executor.get_buffered(url).await?;
            process_update_response(&response)
        }
        .instrument(self.span.clone())
        .await
    }

    async fn fetch_update(&self, url: &str) -> Result<UpdateStream> {
        async {
            let response = self.executor.get(url).await?;
            let length = check_content_length(response.content_length(), self.min_image_size)?;
            debug!(length, "Image download ready");
            Ok(UpdateStream::new(response, length))
        }
        .instrument(self.span.clone())
        .await
    }

    fn is_secure(&self) -> bool {
        false
    }
}

/// Update client whose transport carries TLS trust material
///
/// Request handling is delegated to the inner [`HttpUpdater`].
#[derive(Clone, Debug)]
pub struct HttpsUpdater {
    inner: HttpUpdater,
    credentials: Credentials,
}

impl HttpsUpdater {
    /// Load the trust material named by `config.trust` and build a secured client
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if `config.trust` is empty, since there is nothing to
    /// secure the client with. [`Error::TrustPool`] or [`Error::CredentialLoad`]
    /// if provided material does not load. No client is produced.
    pub async fn new(config: &UpdaterConfig) -> Result<Self> {
        config.validate()?;
        if config.trust.is_empty() {
            return Err(Error::Config {
                message: "no TLS material configured, use a plain client".to_string(),
                key: Some("trust".to_string()),
            });
        }
        let credentials = Credentials::load(&config.trust).await?;
        let client = build_secure_transport(config, &credentials)?;
        Ok(Self::from_parts(
            HttpUpdater::with_transport(client, config.min_image_size),
            credentials,
        ))
    }

    pub(crate) fn from_parts(inner: HttpUpdater, credentials: Credentials) -> Self {
        Self { inner, credentials }
    }

    /// Emit every request event inside `span`
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.inner = self.inner.with_span(span);
        self
    }

    /// Trust material this client was built with
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Smallest image size accepted by [`Updater::fetch_update`]
    pub fn min_image_size(&self) -> u64 {
        self.inner.min_image_size()
    }
}

#[async_trait]
impl Updater for HttpsUpdater {
    async fn check_for_update(&self, url: &str) -> Result<CheckOutcome> {
        self.inner.check_for_update(url).await
    }

    async fn fetch_update(&self, url: &str) -> Result<UpdateStream> {
        self.inner.fetch_update(url).await
    }

    fn is_secure(&self) -> bool {
        true
    }
}

/// Builds the right [`Updater`] for a configuration
#[derive(Debug)]
pub struct UpdaterBuilder {
    config: UpdaterConfig,
    span: Option<Span>,
}

impl UpdaterBuilder {
    /// Start from `config`
    pub fn new(config: UpdaterConfig) -> Self {
        Self { config, span: None }
    }

    /// Span every event of the client is emitted in (default: `updater` at INFO)
    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Build a plain client for an empty trust configuration, a secured one otherwise
    ///
    /// # Errors
    ///
    /// Configuration errors only; they are fatal and should not be retried.
    pub async fn build(self) -> Result<Box<dyn Updater>> {
        let span = self
            .span
            .unwrap_or_else(|| tracing::info_span!("updater"));
        self.config.validate()?;

        let (client, credentials) = build_transport(&self.config)
            .instrument(span.clone())
            .await?;
        let plain = HttpUpdater::with_transport(client, self.config.min_image_size).with_span(span);

        let updater: Box<dyn Updater> = match credentials {
            None => Box::new(plain),
            Some(credentials) => Box::new(HttpsUpdater::from_parts(plain, credentials)),
        };
        Ok(updater)
    }
}

/// Build the client described by `config` with the default span
///
/// # Errors
///
/// See [`UpdaterBuilder::build`].
pub async fn new_updater(config: &UpdaterConfig) -> Result<Box<dyn Updater>> {
    UpdaterBuilder::new(config.clone()).build().await
}
