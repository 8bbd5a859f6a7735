//! Update server responses and TLS material for integration tests

use std::path::PathBuf;
use update_transport::{TrustConfig, UpdaterConfig};

/// Descriptor the mock server hands out for a scheduled update
pub const UPDATE_RESPONSE: &str =
    r#"{"ID":"u1","Image":{"URI":"http://x/img","Checksum":"abc","ID":"i1"}}"#;

/// Same descriptor with the image URI left empty
pub const INCOMPLETE_UPDATE_RESPONSE: &str =
    r#"{"ID":"u1","Image":{"URI":"","Checksum":"abc","ID":"i1"}}"#;

/// Path of a PEM file in `tests/fixtures/`
pub fn pem(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Configuration for a mutually authenticated client using the test CA
pub fn mutual_tls_config() -> UpdaterConfig {
    UpdaterConfig {
        trust: TrustConfig::new(pem("client.pem"), pem("client.key"), pem("ca.pem")),
        ..Default::default()
    }
}

/// Deterministic image payload of `len` bytes
pub fn image_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
