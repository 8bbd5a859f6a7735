//! Transport construction
//!
//! Builds the `reqwest` client every request goes through. With an empty
//! [`TrustConfig`] the client is left untouched. Otherwise the server trust
//! pool and client credential are loaded once and baked into the client for
//! mutual TLS.

mod executor;
mod trust;

pub use executor::{BufferedResponse, RequestExecutor};
pub use trust::{ClientCredential, TrustPool, load_client_credential, load_server_trust};

use crate::config::{TrustConfig, UpdaterConfig};
use crate::error::{Error, Result};
use tracing::{info, warn};

/// TLS material owned by a secured client for its whole lifetime
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    /// Certificate and key presented to the server, if any
    pub client_identity: Option<ClientCredential>,
    /// CA certificates the server must chain to; empty means trust any server
    pub trusted_pool: TrustPool,
}

impl Credentials {
    /// Load both halves of the trust material described by `trust`
    ///
    /// # Errors
    ///
    /// [`Error::TrustPool`] or [`Error::CredentialLoad`] if provided material
    /// fails to load. Missing material only produces warnings.
    pub async fn load(trust: &TrustConfig) -> Result<Self> {
        let trusted_pool = load_server_trust(&trust.server_cert).await?;
        let client_identity = load_client_credential(&trust.client_cert, &trust.client_key).await?;
        Ok(Self {
            client_identity,
            trusted_pool,
        })
    }

    /// True when the server certificate will not be verified
    #[must_use]
    pub fn trusts_any_server(&self) -> bool {
        self.trusted_pool.is_empty()
    }
}

fn base_builder(config: &UpdaterConfig) -> reqwest::ClientBuilder {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .user_agent(config.user_agent.clone());
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    builder
}

/// Build a transport with no TLS customization
///
/// # Errors
///
/// [`Error::ClientBuild`] if the TLS backend cannot be initialized.
pub(crate) fn build_plain_transport(config: &UpdaterConfig) -> Result<reqwest::Client> {
    base_builder(config).build().map_err(Error::ClientBuild)
}

/// Build a transport that verifies the server against `credentials` and
/// presents the client identity during the handshake
///
/// # Errors
///
/// [`Error::ClientBuild`] if the TLS backend rejects the material.
pub(crate) fn build_secure_transport(
    config: &UpdaterConfig,
    credentials: &Credentials,
) -> Result<reqwest::Client> {
    let mut builder = base_builder(config);

    if credentials.trusts_any_server() {
        warn!("Server certificate verification disabled, any server will be trusted");
        builder = builder.danger_accept_invalid_certs(true);
    } else {
        // Only the loaded pool may vouch for the server
        builder = builder.tls_built_in_root_certs(false);
        for certificate in credentials.trusted_pool.certificates() {
            builder = builder.add_root_certificate(certificate.clone());
        }
    }

    if let Some(credential) = &credentials.client_identity {
        builder = builder.identity(credential.identity().clone());
    }

    let client = builder.build().map_err(Error::ClientBuild)?;

    info!(
        trusted_certificates = credentials.trusted_pool.len(),
        client_certificate = credentials.client_identity.is_some(),
        "TLS-enabled update client initialized"
    );
    Ok(client)
}

/// Build the transport described by `config`
///
/// Returns the client and, when TLS material was requested, the credentials
/// that were loaded for it.
///
/// # Errors
///
/// Any trust-loading or client-building error. These are fatal
/// configuration errors and no transport is produced.
pub(crate) async fn build_transport(
    config: &UpdaterConfig,
) -> Result<(reqwest::Client, Option<Credentials>)> {
    if config.trust.is_empty() {
        return Ok((build_plain_transport(config)?, None));
    }

    let credentials = Credentials::load(&config.trust).await?;
    let client = build_secure_transport(config, &credentials)?;
    Ok((client, Some(credentials)))
}
