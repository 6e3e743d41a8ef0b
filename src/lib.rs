//! easyreq - ergonomic, options-driven HTTP requests
//!
//! Describe a request with a [`RequestOptions`] bag: query parameters, one
//! body (JSON, XML, a file upload or a form), headers, credentials, cookies and
//! transport overrides. A [`Requester`] turns it into a request, picks the
//! client to send it with and executes it.
//!
//! ## Features
//!
//! - **One body per request**: JSON, then XML, then file, then form data
//! - **Multipart uploads** on POST, raw streamed uploads otherwise
//! - **Client reuse**: the default client is shared unless a request overrides
//!   TLS verification, compression, proxies, timeouts or cookies
//! - **Per-scheme proxies** with environment fallback
//! - **Cookie jars** scoped by the public suffix list
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use easyreq::{RequestOptions, Requester};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let requester = Requester::new()?;
//!     let options = RequestOptions::new()
//!         .data("name", "easyreq")
//!         .basic_auth("alice", "secret");
//!     let response = requester.post("https://httpbin.org/post", options).await?;
//!
//!     println!("Status: {}", response.status());
//!     println!("Body: {}", response.text().await?);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod body;
pub mod client;
pub mod cookies;
pub mod error;
pub mod multipart;
pub mod proxy;
pub mod query;
pub mod request;
pub mod requester;
pub mod response;
pub mod session;
pub mod timeout;
pub mod tls;
pub mod transport;

// Re-export main types for convenience
pub use auth::BasicAuth;
pub use client::{Client, ClientBuilder, ClientConfig};
pub use cookies::CookieJar;
pub use error::{Error, Result};
pub use proxy::{EnvProxyResolver, ProxyResolver};
pub use request::{FileUpload, Payload, RequestOptions};
pub use requester::Requester;
pub use response::Response;
pub use session::Session;
pub use transport::{ReqwestTransport, Transport};

// Re-export common HTTP types
pub use cookie::Cookie;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode};
pub use url::Url;

/// User agent sent when the options do not set one
pub const DEFAULT_USER_AGENT: &str = concat!("easyreq/", env!("CARGO_PKG_VERSION"));
