use async_trait::async_trait;
use reqwest::{Request as ReqwestRequest, Response as ReqwestResponse};

use crate::client::Client;
use crate::error::Result;

/// Transport trait for HTTP operations
///
/// Executes a fully assembled request with the client chosen for it. The
/// default implementation sends it over the network; tests swap in their own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the response
    async fn execute(&self, client: &Client, request: ReqwestRequest) -> Result<ReqwestResponse>;

    /// Get the transport name/type
    fn name(&self) -> &str;
}

/// Transport that sends requests with reqwest
///
/// Errors are returned exactly as reqwest reports them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    /// Create a new reqwest transport
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, client: &Client, request: ReqwestRequest) -> Result<ReqwestResponse> {
        tracing::debug!(method = %request.method(), url = %request.url(), "dispatching request");
        Ok(client.inner().execute(request).await?)
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}
