//! Single-request execution shared by every client variant

use crate::error::{Error, Result};
use reqwest::{Method, StatusCode};
use tracing::debug;

/// A response whose body has been read completely
///
/// The connection is released once the body is buffered, so holding on to a
/// `BufferedResponse` never pins a socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferedResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Complete response body
    pub body: Vec<u8>,
}

impl BufferedResponse {
    /// Create a buffered response from its parts
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Issues GET requests through a configured transport
///
/// Performs exactly one attempt per call. Cloning is cheap and shares the
/// underlying connection pool.
#[derive(Clone, Debug)]
pub struct RequestExecutor {
    client: reqwest::Client,
}

impl RequestExecutor {
    /// Wrap a configured transport
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Send a GET request and return the live response
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] if `url` does not parse (nothing is sent), or
    /// [`Error::Transport`] if the request cannot be completed.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response> {
        self.send(Method::GET, url).await
    }

    /// Send a GET request and read the whole body before returning
    ///
    /// # Errors
    ///
    /// As [`RequestExecutor::get`], plus [`Error::Io`] if the body cannot be read.
    pub async fn get_buffered(&self, url: &str) -> Result<BufferedResponse> {
        let response = self.get(url).await?;
        let status = response.status();
        debug!("Received response: {}", status);

        let body = response.bytes().await.map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to read response body from '{}': {}",
                url, e
            )))
        })?;

        Ok(BufferedResponse::new(status, body.to_vec()))
    }

    async fn send(&self, method: Method, url: &str) -> Result<reqwest::Response> {
        let parsed = url::Url::parse(url).map_err(|source| Error::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        debug!("Sending HTTP [{}] request: {}", method, parsed);
        let response = self.client.request(method, parsed).send().await?;
        Ok(response)
    }
}
