use http::Method;

use crate::client::Client;
use crate::cookies::CookieJar;
use crate::error::Result;
use crate::request::RequestOptions;
use crate::requester::Requester;
use crate::response::Response;

/// A dedicated client reused across requests
///
/// The client is built once, from the transport settings of the options the
/// session was created with, and always carries a cookie jar: cookies set by
/// one response are sent with the following requests.
///
/// # Examples
///
/// ```rust,no_run
/// use easyreq::{RequestOptions, Requester};
///
/// #[tokio::main]
/// async fn main() -> easyreq::Result<()> {
///     let session = Requester::new()?.session(RequestOptions::new())?;
///     session.post("https://example.com/login", RequestOptions::new().data("user", "alice")).await?;
///     let profile = session.get("https://example.com/profile", RequestOptions::new()).await?;
///     println!("{}", profile.text().await?);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    requester: Requester,
    client: Client,
}

impl Session {
    /// Create a session sending through `requester`'s transport
    ///
    /// Only the transport settings of `options` are used; body, headers and
    /// the other per-request fields are ignored.
    pub fn new(requester: Requester, options: RequestOptions) -> Result<Self> {
        let options = options.use_cookie_jar(true);
        let client = requester.client_builder().build_dedicated(&options)?;
        tracing::debug!(config = ?client.config(), "session started");
        Ok(Self { requester, client })
    }

    /// The session's client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Cookies collected so far
    pub fn cookie_jar(&self) -> Option<&CookieJar> {
        self.client.cookie_jar()
    }

    /// Send a request with the session's client
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response> {
        self.requester
            .perform_request_with_client(method, url, options, &self.client)
            .await
    }

    /// Send a GET request
    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::GET, url, options).await
    }

    /// Send a POST request
    pub async fn post(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::POST, url, options).await
    }

    /// Send a PUT request
    pub async fn put(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::PUT, url, options).await
    }

    /// Send a DELETE request
    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::DELETE, url, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientBuilder;
    use crate::proxy::EnvProxyResolver;
    use crate::transport::recording::RecordingTransport;
    use cookie::Cookie;
    use http::header::COOKIE;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_session_reuses_its_client() {
        let transport = Arc::new(RecordingTransport::default());
        let builder = ClientBuilder::new()
            .unwrap()
            .proxy_resolver(Arc::new(EnvProxyResolver::new()));
        let requester = Requester::with_client_builder(builder).transport(transport.clone());

        let session = requester
            .session(RequestOptions::new().dial_timeout(Duration::from_secs(5)))
            .unwrap();
        assert!(session.cookie_jar().is_some());
        assert!(!session.client().ptr_eq(requester.default_client()));

        session.get("http://example.com/a", RequestOptions::new()).await.unwrap();
        let first = transport.last().client;
        session
            .post("http://example.com/b", RequestOptions::new().insecure_skip_verify(true))
            .await
            .unwrap();
        let second = transport.last().client;

        assert_eq!(transport.calls(), 2);
        assert!(first.ptr_eq(session.client()));
        assert!(second.ptr_eq(session.client()));
        assert_eq!(
            session.client().config().timeouts.unwrap().dial_timeout,
            Duration::from_secs(5)
        );
    }

    #[tokio::test]
    async fn test_explicit_cookies_join_stored_ones() {
        let transport = Arc::new(RecordingTransport::default());
        let builder = ClientBuilder::new()
            .unwrap()
            .proxy_resolver(Arc::new(EnvProxyResolver::new()));
        let requester = Requester::with_client_builder(builder).transport(transport.clone());
        let session = requester.session(RequestOptions::new()).unwrap();

        let origin: url::Url = "http://example.com/".parse().unwrap();
        session.cookie_jar().unwrap().add_cookie_str("sid=abc", &origin);

        session
            .get("http://example.com/me", RequestOptions::new().cookie(Cookie::new("a", "1")))
            .await
            .unwrap();
        assert_eq!(transport.last().headers[COOKIE], "a=1; sid=abc");

        // Without explicit cookies the jar is left to the client.
        session.get("http://example.com/me", RequestOptions::new()).await.unwrap();
        assert!(transport.last().headers.get(COOKIE).is_none());
    }
}
