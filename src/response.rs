use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use reqwest::{Response as ReqwestResponse, StatusCode};
use url::Url;

use crate::error::Result;

/// HTTP response returned by the transport
///
/// Status, headers and final URL are available right away; the body is read
/// by one of the consuming methods.
#[derive(Debug)]
pub struct Response {
    inner: ReqwestResponse,
}

impl Response {
    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Get the HTTP version
    pub fn version(&self) -> http::Version {
        self.inner.version()
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Get a specific header value
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.inner.headers().get(name)
    }

    /// Get the content type
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the content length
    pub fn content_length(&self) -> Option<u64> {
        self.header(CONTENT_LENGTH.as_str())
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
    }

    /// Get the final URL, after redirects
    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    /// Check if the response is successful (2xx status code)
    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Turn 4xx and 5xx statuses into a transport error
    pub fn error_for_status(self) -> Result<Self> {
        Ok(Self {
            inner: self.inner.error_for_status()?,
        })
    }

    /// Get the response body as text
    pub async fn text(self) -> Result<String> {
        Ok(self.inner.text().await?)
    }

    /// Get the response body as bytes
    pub async fn bytes(self) -> Result<Vec<u8>> {
        Ok(self.inner.bytes().await?.to_vec())
    }

    /// Get the response body as JSON
    pub async fn json<T>(self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(self.inner.json().await?)
    }

    /// Get the underlying reqwest response
    pub fn into_inner(self) -> ReqwestResponse {
        self.inner
    }
}

impl From<ReqwestResponse> for Response {
    fn from(inner: ReqwestResponse) -> Self {
        Self { inner }
    }
}
