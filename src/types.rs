//! Core types exchanged with the update server

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

/// Image section of an update descriptor
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Where the image can be downloaded from
    #[serde(
        rename = "URI",
        alias = "uri",
        alias = "Uri",
        default,
        deserialize_with = "null_as_default",
    )]
    pub uri: String,

    /// Checksum of the image (SHA-256, hex)
    #[serde(
        rename = "Checksum",
        alias = "checksum",
        default,
        deserialize_with = "null_as_default",
    )]
    pub checksum: String,

    /// Image identifier
    #[serde(
        rename = "ID",
        alias = "id",
        alias = "Id",
        default,
        deserialize_with = "null_as_default",
    )]
    pub id: String,
}

/// Metadata of an update scheduled for this device
///
/// Wire format:
///
/// ```json
/// { "ID": "u1", "Image": { "URI": "http://x/img", "Checksum": "abc", "ID": "i1" } }
/// ```
///
/// Absent or `null` keys decode to empty strings; [`UpdateDescriptor::validate`]
/// rejects them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    /// Update (deployment) identifier
    #[serde(
        rename = "ID",
        alias = "id",
        alias = "Id",
        default,
        deserialize_with = "null_as_default",
    )]
    pub id: String,

    /// Image to install
    #[serde(
        rename = "Image",
        alias = "image",
        default,
        deserialize_with = "null_as_default",
    )]
    pub image: ImageInfo,
}

impl UpdateDescriptor {
    /// Wire names of required fields that are empty
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("ID", &self.id),
            ("Image.ID", &self.image.id),
            ("Image.Checksum", &self.image.checksum),
            ("Image.URI", &self.image.uri),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// A descriptor is valid iff all four identifying strings are non-empty
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(Error::IncompleteResponse { missing });
        }
        info!(uri = %self.image.uri, "Received valid update descriptor");
        Ok(())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result of a successful update check
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The server scheduled an update for this device
    UpdateAvailable(UpdateDescriptor),
    /// The server has nothing for this device right now
    NoUpdate,
}

impl CheckOutcome {
    /// The descriptor, if an update is available
    pub fn update(&self) -> Option<&UpdateDescriptor> {
        match self {
            CheckOutcome::UpdateAvailable(descriptor) => Some(descriptor),
            CheckOutcome::NoUpdate => None,
        }
    }

    /// Consume the outcome, yielding the descriptor if an update is available
    pub fn into_update(self) -> Option<UpdateDescriptor> {
        match self {
            CheckOutcome::UpdateAvailable(descriptor) => Some(descriptor),
            CheckOutcome::NoUpdate => None,
        }
    }
}
