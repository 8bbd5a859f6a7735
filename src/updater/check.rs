//! Update-check response handling
//!
//! | Status | Meaning                                   |
//! |--------|-------------------------------------------|
//! | 200    | update available, body is a descriptor    |
//! | 204    | no update available                       |
//! | 404    | client not authorized                     |
//! | other  | unexpected                                |

use crate::error::{Error, Result};
use crate::transport::BufferedResponse;
use crate::types::{CheckOutcome, UpdateDescriptor};
use serde_json::error::Category;
use tracing::debug;

/// Status the server uses when an update is scheduled for the device
pub const UPDATE_RESPONSE_HAVE_UPDATE: u16 = 200;
/// Status the server uses when there is nothing to install
pub const UPDATE_RESPONSE_NO_UPDATES: u16 = 204;
/// Status the server uses to refuse scheduling for this device
pub const UPDATE_RESPONSE_ERROR: u16 = 404;

/// Classify a buffered update-check response
///
/// # Errors
///
/// - [`Error::MalformedResponse`] / [`Error::Decode`] if a 200 body does not decode
/// - [`Error::IncompleteResponse`] if the descriptor is missing fields
/// - [`Error::Unauthorized`] for 404
/// - [`Error::UnexpectedStatus`] for anything else
pub fn process_update_response(response: &BufferedResponse) -> Result<CheckOutcome> {
    match response.status.as_u16() {
        UPDATE_RESPONSE_HAVE_UPDATE => {
            debug!("Have update available");
            let descriptor = decode_descriptor(&response.body)?;
            descriptor.validate()?;
            Ok(CheckOutcome::UpdateAvailable(descriptor))
        }
        UPDATE_RESPONSE_NO_UPDATES => {
            debug!("No update available");
            Ok(CheckOutcome::NoUpdate)
        }
        UPDATE_RESPONSE_ERROR => Err(Error::Unauthorized),
        other => Err(Error::UnexpectedStatus(other)),
    }
}

/// Decode a descriptor, keeping syntax errors apart from shape errors
///
/// Truncated input counts as a syntax error. A `null` document decodes to an
/// empty descriptor so validation reports every missing field.
pub fn decode_descriptor(body: &[u8]) -> Result<UpdateDescriptor> {
    serde_json::from_slice::<Option<UpdateDescriptor>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| match e.classify() {
            Category::Syntax | Category::Eof => Error::MalformedResponse(e),
            Category::Data | Category::Io => Error::Decode(e),
        })
}
