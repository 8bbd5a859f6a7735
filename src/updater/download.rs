//! Image download guard and stream

use crate::error::{Error, Result};
use futures::{StreamExt, TryStreamExt};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::debug;

/// Reject declared image sizes that are unknown or too small to be real
///
/// Returns the accepted length.
///
/// # Errors
///
/// [`Error::UnknownSize`] when no length was declared, [`Error::ImplausiblySmall`]
/// when it is below `minimum`.
pub fn check_content_length(declared: Option<u64>, minimum: u64) -> Result<u64> {
    match declared {
        None => Err(Error::UnknownSize),
        Some(length) if length < minimum => Err(Error::ImplausiblySmall { length, minimum }),
        Some(length) => Ok(length),
    }
}

/// Live image download
///
/// Owns the HTTP response. The connection is released when the stream is
/// consumed or dropped.
#[must_use]
#[derive(Debug)]
pub struct UpdateStream {
    response: reqwest::Response,
    length: u64,
}

impl UpdateStream {
    pub(crate) fn new(response: reqwest::Response, length: u64) -> Self {
        Self { response, length }
    }

    /// Declared image size in bytes
    pub fn length(&self) -> u64 {
        self.length
    }

    /// HTTP status of the download response
    pub fn status(&self) -> reqwest::StatusCode {
        self.response.status()
    }

    /// Turn the body into a tokio reader
    pub fn into_async_read(self) -> impl AsyncRead + Send + Unpin {
        let stream = self.response.bytes_stream().map_err(std::io::Error::other);
        StreamReader::new(Box::pin(stream))
    }

    /// Copy the whole image into `writer`, returning the number of bytes written
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if reading the body or writing fails.
    pub async fn copy_to<W>(self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut reader = self.into_async_read();
        let written = tokio::io::copy(&mut reader, writer).await?;
        writer.flush().await?;
        Ok(written)
    }

    /// Copy the whole image into `writer` while hashing it with SHA-256
    ///
    /// `expected` is the hex checksum from the update descriptor (case-insensitive).
    ///
    /// # Errors
    ///
    /// [`Error::ChecksumMismatch`] if the digest differs. The bytes have already
    /// been written by then; the caller must discard them.
    pub async fn copy_verified<W>(self, writer: &mut W, expected: &str) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut hasher = Sha256::new();
        let mut written: u64 = 0;
        let mut stream = Box::pin(self.response.bytes_stream());

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "Failed to read image body: {}",
                    e
                )))
            })?;
            hasher.update(&chunk);
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        let actual = format!("{:x}", hasher.finalize());
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(Error::ChecksumMismatch {
                expected: expected.to_string(),
                actual,
            });
        }

        debug!(bytes = written, "Image checksum verified");
        Ok(written)
    }
}
