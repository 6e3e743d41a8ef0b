use std::fmt;
use std::sync::Arc;

use http::header::{CONTENT_TYPE, COOKIE, HeaderName};
use http::{HeaderValue, Method};
use reqwest::Request as ReqwestRequest;

use crate::body::encode_body;
use crate::client::{Client, ClientBuilder};
use crate::cookies::append_cookies;
use crate::error::Result;
use crate::query::resolve_url;
use crate::request::RequestOptions;
use crate::response::Response;
use crate::session::Session;
use crate::transport::{ReqwestTransport, Transport};

const X_REQUESTED_WITH: &str = "x-requested-with";

/// Entry point for sending requests
///
/// Owns the default client and the transport. Cloning is cheap and clones
/// share both.
///
/// # Examples
///
/// ```rust,no_run
/// use easyreq::{RequestOptions, Requester};
///
/// #[tokio::main]
/// async fn main() -> easyreq::Result<()> {
///     let requester = Requester::new()?;
///     let response = requester
///         .get("https://httpbin.org/get", RequestOptions::new().param("q", "rust"))
///         .await?;
///     println!("{}", response.status());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Requester {
    client_builder: ClientBuilder,
    transport: Arc<dyn Transport>,
}

impl Requester {
    /// Create a requester with a fresh default client and the reqwest transport
    pub fn new() -> Result<Self> {
        Ok(Self::with_client_builder(ClientBuilder::new()?))
    }

    /// Create a requester around an existing client builder
    pub fn with_client_builder(client_builder: ClientBuilder) -> Self {
        Self {
            client_builder,
            transport: Arc::new(ReqwestTransport::new()),
        }
    }

    /// Replace the transport requests are executed through
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// The client builder used to pick each request's client
    pub fn client_builder(&self) -> &ClientBuilder {
        &self.client_builder
    }

    /// The shared default client
    pub fn default_client(&self) -> &Client {
        self.client_builder.default_client()
    }

    /// Build the request and pick the client it will be sent with
    ///
    /// Nothing is sent. A failure to parse the URL or encode the body is
    /// returned before any client is chosen; the upload stream, if any, has
    /// been released either way.
    pub async fn assemble(
        &self,
        method: Method,
        url: &str,
        mut options: RequestOptions,
        client: Option<&Client>,
    ) -> Result<(ReqwestRequest, Client)> {
        let url = resolve_url(url, &options.params)?;

        let encoded = encode_body(&method, options.take_body_source()).await?;
        let mut request = ReqwestRequest::new(method, url);
        if let Some(content_type) = encoded.content_type {
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_str(&content_type)?);
        }
        *request.body_mut() = encoded.body;

        let headers = request.headers_mut();
        for (name, value) in &options.headers {
            headers.insert(name.clone(), value.clone());
        }
        options.apply_user_agent(headers);
        if let Some(auth) = &options.auth {
            auth.apply(headers);
        }
        if options.is_ajax {
            headers.insert(
                HeaderName::from_static(X_REQUESTED_WITH),
                HeaderValue::from_static("XMLHttpRequest"),
            );
        }
        append_cookies(headers, &options.cookies);

        let client = match client {
            Some(client) => client.clone(),
            None => self.client_builder.build_client(&options)?,
        };
        // reqwest skips the jar once a Cookie header is present.
        if let Some(jar) = client.cookie_jar() {
            if request.headers().contains_key(COOKIE) {
                let stored = jar.cookies_for_url(request.url());
                append_cookies(request.headers_mut(), &stored);
            }
        }
        Ok((request, client))
    }

    /// Assemble a request and send it with the client chosen for it
    pub async fn perform_request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response> {
        let (request, client) = self.assemble(method, url, options, None).await?;
        self.dispatch(&client, request).await
    }

    /// Assemble a request and send it with `client`, skipping client selection
    pub async fn perform_request_with_client(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
        client: &Client,
    ) -> Result<Response> {
        let (request, client) = self.assemble(method, url, options, Some(client)).await?;
        self.dispatch(&client, request).await
    }

    /// Start a session whose dedicated client is configured from `options`
    pub fn session(&self, options: RequestOptions) -> Result<Session> {
        Session::new(self.clone(), options)
    }

    /// Send a GET request
    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.perform_request(Method::GET, url, options).await
    }

    /// Send a POST request
    pub async fn post(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.perform_request(Method::POST, url, options).await
    }

    /// Send a PUT request
    pub async fn put(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.perform_request(Method::PUT, url, options).await
    }

    /// Send a PATCH request
    pub async fn patch(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.perform_request(Method::PATCH, url, options).await
    }

    /// Send a DELETE request
    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.perform_request(Method::DELETE, url, options).await
    }

    /// Send a HEAD request
    pub async fn head(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.perform_request(Method::HEAD, url, options).await
    }

    /// Send an OPTIONS request
    pub async fn options(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.perform_request(Method::OPTIONS, url, options).await
    }

    async fn dispatch(&self, client: &Client, request: ReqwestRequest) -> Result<Response> {
        tracing::trace!(transport = self.transport.name(), "executing request");
        let response = self.transport.execute(client, request).await?;
        Ok(Response::from(response))
    }
}

impl fmt::Debug for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requester")
            .field("client_builder", &self.client_builder)
            .field("transport", &self.transport.name())
            .finish()
    }
}
