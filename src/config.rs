//! Configuration types for update-transport

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Smallest image the downloader will accept, in bytes
pub const DEFAULT_MIN_IMAGE_SIZE: u64 = 4096;

/// TLS trust material for talking to the update server
///
/// All paths are optional. An empty path means "not provided". When every path
/// is empty the client talks plain HTTP (or HTTPS with default verification).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Certificate that authenticates this device to the server (PEM)
    #[serde(default)]
    pub client_cert: PathBuf,

    /// Private key matching `client_cert` (PEM, PKCS#8/PKCS#1/SEC1)
    #[serde(default)]
    pub client_key: PathBuf,

    /// CA certificate(s) the server certificate must chain to (PEM)
    #[serde(default)]
    pub server_cert: PathBuf,
}

impl TrustConfig {
    /// Create a trust configuration from the three file paths
    pub fn new(
        client_cert: impl Into<PathBuf>,
        client_key: impl Into<PathBuf>,
        server_cert: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client_cert: client_cert.into(),
            client_key: client_key.into(),
            server_cert: server_cert.into(),
        }
    }

    /// True when no TLS material was requested at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Update client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// TLS trust material (default: none, plain client)
    #[serde(default)]
    pub trust: TrustConfig,

    /// Minimum plausible image size in bytes (default: 4096)
    ///
    /// Download responses declaring fewer bytes are rejected before the body is
    /// exposed, so an error page is never mistaken for an image.
    #[serde(default = "default_min_image_size")]
    pub min_image_size: u64,

    /// Overall request timeout, enforced by the transport (default: none)
    #[serde(default, with = "optional_duration_serde")]
    pub timeout: Option<Duration>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            trust: TrustConfig::default(),
            min_image_size: default_min_image_size(),
            timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

impl UpdaterConfig {
    /// Check settings that would make every request fail or every image pass
    pub fn validate(&self) -> Result<()> {
        if self.min_image_size == 0 {
            return Err(Error::Config {
                message: "minimum image size must be greater than zero".to_string(),
                key: Some("min_image_size".to_string()),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::Config {
                message: "user agent must not be empty".to_string(),
                key: Some("user_agent".to_string()),
            });
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::Config {
                message: "timeout must be greater than zero when set".to_string(),
                key: Some("timeout".to_string()),
            });
        }
        Ok(())
    }
}

fn default_min_image_size() -> u64 {
    DEFAULT_MIN_IMAGE_SIZE
}

fn default_user_agent() -> String {
    concat!("update-transport/", env!("CARGO_PKG_VERSION")).to_string()
}

// Optional Duration serialization helper (whole seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
