//! Loading of TLS trust material from disk
//!
//! Both loaders treat an empty path as "not provided" and fall back to an
//! insecure mode with a warning instead of failing. Anything that *was*
//! provided must load cleanly.

use crate::error::{Error, Result};
use rustls::pki_types::CertificateDer;
use rustls::sign::CertifiedKey;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Set of CA certificates the server certificate must chain to
///
/// An empty pool means no server verification at all.
#[derive(Clone, Default)]
pub struct TrustPool {
    certificates: Vec<reqwest::Certificate>,
}

impl TrustPool {
    /// A pool that trusts nothing in particular (and therefore every server)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of trusted CA certificates
    #[must_use]
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// True when the pool holds no certificates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub(crate) fn certificates(&self) -> &[reqwest::Certificate] {
        &self.certificates
    }
}

impl fmt::Debug for TrustPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustPool")
            .field("certificates", &self.certificates.len())
            .finish()
    }
}

/// Certificate chain and private key presented to the server
#[derive(Clone)]
pub struct ClientCredential {
    identity: reqwest::Identity,
    cert_path: PathBuf,
}

impl ClientCredential {
    pub(crate) fn identity(&self) -> &reqwest::Identity {
        &self.identity
    }
}

impl fmt::Debug for ClientCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredential")
            .field("cert_path", &self.cert_path)
            .finish_non_exhaustive()
    }
}

/// Load the CA certificates used to verify the update server
///
/// # Errors
///
/// Returns [`Error::TrustPool`] if the file cannot be read or contains no
/// certificate usable as a trust anchor.
pub async fn load_server_trust(path: &Path) -> Result<TrustPool> {
    if path.as_os_str().is_empty() {
        warn!("Server certificate not provided, trusting all servers");
        return Ok(TrustPool::empty());
    }

    let fail = |reason: String| Error::TrustPool {
        path: path.to_path_buf(),
        reason,
    };

    let pem = tokio::fs::read(path)
        .await
        .map_err(|e| fail(format!("failed to read file: {}", e)))?;

    let certificates = parse_trust_anchors(&pem)
        .map_err(fail)?
        .iter()
        .map(|der| reqwest::Certificate::from_der(der))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| fail(format!("rejected by TLS backend: {}", e)))?;

    if certificates.is_empty() {
        return Err(fail("no usable PEM certificates found".to_string()));
    }

    debug!(
        path = %path.display(),
        count = certificates.len(),
        "Loaded trusted server certificates"
    );

    Ok(TrustPool { certificates })
}

/// Parse every PEM `CERTIFICATE` block that is usable as a trust anchor
///
/// Blocks that are valid PEM but not valid X.509 are skipped, like a system
/// trust store would. Broken PEM framing is an error.
pub(crate) fn parse_trust_anchors(
    pem: &[u8],
) -> std::result::Result<Vec<CertificateDer<'static>>, String> {
    let blocks = rustls_pemfile::certs(&mut &pem[..])
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid PEM: {}", e))?;

    let mut store = rustls::RootCertStore::empty();
    let mut usable = Vec::with_capacity(blocks.len());
    for der in blocks {
        match store.add(der.clone()) {
            Ok(()) => usable.push(der),
            Err(e) => debug!("Skipping unusable certificate: {}", e),
        }
    }
    Ok(usable)
}

/// Load and pair the client certificate chain and private key
///
/// Returns `Ok(None)` when either path is empty; the server will then see an
/// unauthenticated client.
///
/// # Errors
///
/// Returns [`Error::CredentialLoad`] if either file cannot be read, contains
/// no certificate or key, or the key does not belong to the leaf certificate.
pub async fn load_client_credential(
    cert_path: &Path,
    key_path: &Path,
) -> Result<Option<ClientCredential>> {
    if cert_path.as_os_str().is_empty() || key_path.as_os_str().is_empty() {
        warn!("No client certificate and key provided, connecting as an unauthenticated client");
        return Ok(None);
    }

    let fail = |reason: String| Error::CredentialLoad {
        cert: cert_path.to_path_buf(),
        key: key_path.to_path_buf(),
        reason,
    };

    let cert_pem = tokio::fs::read(cert_path)
        .await
        .map_err(|e| fail(format!("failed to read certificate: {}", e)))?;
    let key_pem = tokio::fs::read(key_path)
        .await
        .map_err(|e| fail(format!("failed to read private key: {}", e)))?;

    check_key_permissions(key_path).await;

    let chain = rustls_pemfile::certs(&mut cert_pem.as_slice())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| fail(format!("invalid certificate PEM: {}", e)))?;
    if chain.is_empty() {
        return Err(fail("no certificate found".to_string()));
    }

    let private_key = rustls_pemfile::private_key(&mut key_pem.as_slice())
        .map_err(|e| fail(format!("invalid private key PEM: {}", e)))?
        .ok_or_else(|| fail("no private key found".to_string()))?;

    let signing_key = rustls::crypto::ring::sign::any_supported_type(&private_key)
        .map_err(|e| fail(format!("unsupported private key: {}", e)))?;

    let chain_len = chain.len();
    CertifiedKey::new(chain, signing_key)
        .keys_match()
        .map_err(|e| fail(format!("private key does not match certificate: {}", e)))?;

    // reqwest takes certificate and key as one PEM bundle
    let mut identity_pem = cert_pem;
    identity_pem.push(b'\n');
    identity_pem.extend_from_slice(&key_pem);
    let identity = reqwest::Identity::from_pem(&identity_pem)
        .map_err(|e| fail(format!("failed to create client identity: {}", e)))?;

    debug!(
        cert = %cert_path.display(),
        chain_len,
        "Loaded client certificate"
    );

    Ok(Some(ClientCredential {
        identity,
        cert_path: cert_path.to_path_buf(),
    }))
}

#[cfg(unix)]
async fn check_key_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            let mode = metadata.permissions().mode() & 0o777;
            if mode & 0o077 != 0 {
                warn!(
                    "Client private key {} has permissions {:o}, expected 600",
                    path.display(),
                    mode
                );
            }
        }
        Err(e) => debug!("Could not stat {}: {}", path.display(), e),
    }
}

#[cfg(not(unix))]
async fn check_key_permissions(_path: &Path) {}
