use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cookie::Cookie;
use http::header::{HeaderName, USER_AGENT};
use http::{HeaderMap, HeaderValue};
use serde::Serialize;
use tokio::io::AsyncRead;
use url::Url;

use crate::auth::BasicAuth;
use crate::client::Client;
use crate::error::Result;

/// Byte stream accepted as the contents of a file upload
pub type FileStream = Box<dyn AsyncRead + Send + Sync + Unpin + 'static>;

/// A serializable body value whose concrete type has been erased
///
/// The value is rendered lazily, when the body is encoded, so that a value
/// which cannot be serialized surfaces as an encoding error of that request.
#[derive(Clone)]
pub struct Payload(Arc<dyn ErasedPayload>);

trait ErasedPayload: Send + Sync {
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
    fn to_xml(&self) -> std::result::Result<String, quick_xml::DeError>;
}

impl<T> ErasedPayload for T
where
    T: Serialize + Send + Sync,
{
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    fn to_xml(&self) -> std::result::Result<String, quick_xml::DeError> {
        quick_xml::se::to_string(self)
    }
}

impl Payload {
    /// Wrap a serializable value
    pub fn new<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Payload(Arc::new(value))
    }

    /// Render the value as JSON
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(self.0.to_json()?)
    }

    /// Render the value as XML
    pub fn to_xml(&self) -> Result<String> {
        Ok(self.0.to_xml()?)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(..)")
    }
}

/// A file to upload, identified by name and backed by a byte stream
pub struct FileUpload {
    /// File name sent in the multipart part, and used to guess the MIME type
    pub file_name: String,
    /// The contents; a missing stream is rejected on multipart uploads
    pub file_contents: Option<FileStream>,
}

impl FileUpload {
    /// Create an upload from a name and an async reader
    pub fn new<R>(file_name: impl Into<String>, contents: R) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        Self {
            file_name: file_name.into(),
            file_contents: Some(Box::new(contents)),
        }
    }

    /// Create an upload that has a name but no stream
    pub fn without_contents(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_contents: None,
        }
    }

    /// Open a file on disk for upload, naming it after the path's file name
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        Ok(Self::new(file_name, file))
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("has_contents", &self.file_contents.is_some())
            .finish()
    }
}

/// The single body strategy chosen for a request
#[derive(Debug)]
pub enum BodySource {
    /// No body and no content type
    Empty,
    /// JSON-encoded value
    Json(Payload),
    /// XML-encoded value
    Xml(Payload),
    /// File upload, with extra multipart fields for POST
    File {
        upload: FileUpload,
        fields: HashMap<String, String>,
    },
    /// URL-encoded form
    Form(HashMap<String, String>),
}

impl BodySource {
    /// Short name of the strategy, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            BodySource::Empty => "empty",
            BodySource::Json(_) => "json",
            BodySource::Xml(_) => "xml",
            BodySource::File { .. } => "file",
            BodySource::Form(_) => "form",
        }
    }
}

/// Everything that describes one request: body, query, headers and
/// transport overrides
///
/// Built by value with chained setters and consumed by a single call to
/// [`Requester::perform_request`](crate::Requester::perform_request).
///
/// # Examples
///
/// ```rust
/// use easyreq::RequestOptions;
///
/// let options = RequestOptions::new()
///     .param("page", "2")
///     .header("Accept", "application/json")
///     .unwrap()
///     .basic_auth("alice", "secret");
/// ```
#[derive(Default)]
pub struct RequestOptions {
    pub(crate) json: Option<Payload>,
    pub(crate) xml: Option<Payload>,
    pub(crate) file: Option<FileUpload>,
    pub(crate) data: Option<HashMap<String, String>>,
    pub(crate) params: HashMap<String, String>,
    pub(crate) headers: HeaderMap,
    pub(crate) user_agent: Option<HeaderValue>,
    pub(crate) auth: Option<BasicAuth>,
    pub(crate) is_ajax: bool,
    pub(crate) cookies: Vec<Cookie<'static>>,
    pub(crate) use_cookie_jar: bool,
    pub(crate) proxies: HashMap<String, Url>,
    pub(crate) insecure_skip_verify: bool,
    pub(crate) disable_compression: bool,
    pub(crate) tls_handshake_timeout: Duration,
    pub(crate) dial_timeout: Duration,
    pub(crate) dial_keep_alive: Duration,
    pub(crate) http_client: Option<Client>,
}

impl RequestOptions {
    /// Create an empty options bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Send a JSON body
    pub fn json<T>(mut self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.json = Some(Payload::new(value));
        self
    }

    /// Send an XML body
    pub fn xml<T>(mut self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.xml = Some(Payload::new(value));
        self
    }

    /// Upload a file
    pub fn file(mut self, upload: FileUpload) -> Self {
        self.file = Some(upload);
        self
    }

    /// Add a form field (or a multipart field when a file is uploaded)
    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace all form fields
    pub fn form(mut self, data: HashMap<String, String>) -> Self {
        self.data = Some(data);
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add several query parameters
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a header, replacing any earlier value of the same name
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = name.parse::<HeaderName>()?;
        let value = value.parse::<HeaderValue>()?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Merge a header map
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers {
            if let Some(name) = name {
                self.headers.insert(name, value);
            }
        }
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: &str) -> Result<Self> {
        if user_agent.is_empty() {
            self.user_agent = None;
        } else {
            self.user_agent = Some(user_agent.parse::<HeaderValue>()?);
        }
        Ok(self)
    }

    /// Use HTTP basic authentication
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(BasicAuth::new(username, password));
        self
    }

    /// Mark the request as an XMLHttpRequest
    pub fn ajax(mut self, is_ajax: bool) -> Self {
        self.is_ajax = is_ajax;
        self
    }

    /// Attach a cookie to the request
    pub fn cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Ask for a dedicated client that stores cookies set by the server
    pub fn use_cookie_jar(mut self, enabled: bool) -> Self {
        self.use_cookie_jar = enabled;
        self
    }

    /// Route requests of one URL scheme through a proxy
    pub fn proxy(mut self, scheme: impl Into<String>, proxy: Url) -> Self {
        self.proxies.insert(scheme.into(), proxy);
        self
    }

    /// Skip TLS certificate validation
    pub fn insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Turn off transparent response decompression
    pub fn disable_compression(mut self, disable: bool) -> Self {
        self.disable_compression = disable;
        self
    }

    /// Maximum time to wait for a TLS handshake
    pub fn tls_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.tls_handshake_timeout = timeout;
        self
    }

    /// Maximum time to wait for a TCP connect
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// TCP keep-alive period of new connections
    pub fn dial_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.dial_keep_alive = keep_alive;
        self
    }

    /// Send through an existing client, bypassing client selection
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Whether any transport override requires a client other than the default one
    pub fn needs_dedicated_client(&self) -> bool {
        self.insecure_skip_verify
            || self.disable_compression
            || !self.proxies.is_empty()
            || !self.tls_handshake_timeout.is_zero()
            || !self.dial_timeout.is_zero()
            || !self.dial_keep_alive.is_zero()
            || !self.cookies.is_empty()
            || self.use_cookie_jar
    }

    /// Move the body sources out, keeping only the one with the highest
    /// precedence: JSON, then XML, then file, then form data
    pub fn take_body_source(&mut self) -> BodySource {
        let json = self.json.take();
        let xml = self.xml.take();
        let file = self.file.take();
        let data = self.data.take();

        if let Some(payload) = json {
            return BodySource::Json(payload);
        }
        if let Some(payload) = xml {
            return BodySource::Xml(payload);
        }
        if let Some(upload) = file {
            return BodySource::File {
                upload,
                fields: data.unwrap_or_default(),
            };
        }
        match data {
            Some(data) => BodySource::Form(data),
            None => BodySource::Empty,
        }
    }

    pub(crate) fn apply_user_agent(&self, headers: &mut HeaderMap) {
        let value = self
            .user_agent
            .clone()
            .unwrap_or_else(|| HeaderValue::from_static(crate::DEFAULT_USER_AGENT));
        headers.insert(USER_AGENT, value);
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("json", &self.json.is_some())
            .field("xml", &self.xml.is_some())
            .field("file", &self.file)
            .field("data", &self.data)
            .field("params", &self.params)
            .field("headers", &self.headers)
            .field("user_agent", &self.user_agent)
            .field("auth", &self.auth)
            .field("is_ajax", &self.is_ajax)
            .field("cookies", &self.cookies.len())
            .field("use_cookie_jar", &self.use_cookie_jar)
            .field("proxies", &self.proxies)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("disable_compression", &self.disable_compression)
            .field("tls_handshake_timeout", &self.tls_handshake_timeout)
            .field("dial_timeout", &self.dial_timeout)
            .field("dial_keep_alive", &self.dial_keep_alive)
            .field("http_client", &self.http_client.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Note {
        text: String,
    }

    #[test]
    fn test_json_wins_over_xml() {
        let mut options = RequestOptions::new()
            .xml(Note { text: "xml".into() })
            .json(Note { text: "json".into() })
            .data("a", "1");

        assert!(matches!(options.take_body_source(), BodySource::Json(_)));
        // Sources are consumed, the remaining ones are dropped.
        assert!(matches!(options.take_body_source(), BodySource::Empty));
    }

    #[test]
    fn test_file_carries_data_as_fields() {
        let mut options = RequestOptions::new()
            .data("note", "hi")
            .file(FileUpload::new("a.txt", &b"0123456789"[..]));

        match options.take_body_source() {
            BodySource::File { upload, fields } => {
                assert_eq!(upload.file_name, "a.txt");
                assert_eq!(fields.get("note").map(String::as_str), Some("hi"));
            }
            other => panic!("unexpected body source: {}", other.kind()),
        }
    }

    #[test]
    fn test_data_only_is_form() {
        let mut options = RequestOptions::new().data("b", "2");
        assert_eq!(options.take_body_source().kind(), "form");
        assert_eq!(RequestOptions::new().take_body_source().kind(), "empty");
    }

    #[test]
    fn test_default_options_use_default_client() {
        assert!(!RequestOptions::new().needs_dedicated_client());
        assert!(!RequestOptions::new()
            .param("q", "1")
            .basic_auth("a", "b")
            .ajax(true)
            .needs_dedicated_client());
    }

    #[test]
    fn test_each_override_needs_dedicated_client() {
        let proxy: Url = "http://127.0.0.1:3128".parse().unwrap();
        let cases = vec![
            RequestOptions::new().insecure_skip_verify(true),
            RequestOptions::new().disable_compression(true),
            RequestOptions::new().proxy("http", proxy),
            RequestOptions::new().tls_handshake_timeout(Duration::from_secs(1)),
            RequestOptions::new().dial_timeout(Duration::from_secs(1)),
            RequestOptions::new().dial_keep_alive(Duration::from_secs(1)),
            RequestOptions::new().cookie(Cookie::new("session", "abc")),
            RequestOptions::new().use_cookie_jar(true),
        ];
        for options in cases {
            assert!(options.needs_dedicated_client(), "{:?}", options);
        }
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        assert!(RequestOptions::new().header("bad header", "x").is_err());
        assert!(RequestOptions::new().header("X-Ok", "bad\nvalue").is_err());
    }

    #[test]
    fn test_user_agent_default() {
        let mut headers = HeaderMap::new();
        RequestOptions::new().apply_user_agent(&mut headers);
        assert_eq!(headers[USER_AGENT], crate::DEFAULT_USER_AGENT);

        let options = RequestOptions::new().user_agent("custom/1.0").unwrap();
        options.apply_user_agent(&mut headers);
        assert_eq!(headers[USER_AGENT], "custom/1.0");
    }
}
