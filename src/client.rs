use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use reqwest::Client as ReqwestClient;
use url::Url;

use crate::cookies::CookieJar;
use crate::error::Result;
use crate::proxy::{EnvProxyResolver, ProxyResolver, ProxySettings};
use crate::request::RequestOptions;
use crate::timeout::TimeoutConfig;
use crate::tls::TlsConfig;

/// Settings a client was built with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// TLS verification settings
    pub tls: TlsConfig,
    /// Whether responses are transparently decompressed
    pub compression: bool,
    /// Connection timeouts; `None` means the HTTP stack's own defaults
    pub timeouts: Option<TimeoutConfig>,
    /// Per-scheme proxy overrides
    pub proxies: HashMap<String, Url>,
    /// Whether a cookie jar is attached
    pub cookie_jar: bool,
}

impl ClientConfig {
    /// Whether the client accepts invalid TLS certificates
    pub fn accepts_invalid_certs(&self) -> bool {
        !self.tls.is_verify_enabled()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tls: TlsConfig::default(),
            compression: true,
            timeouts: None,
            proxies: HashMap::new(),
            cookie_jar: false,
        }
    }
}

/// An HTTP client requests are executed with
///
/// Cheap to clone: clones share the connection pool, configuration and
/// cookie jar.
///
/// # Examples
///
/// ```rust
/// use easyreq::Client;
///
/// let client = Client::new().unwrap();
/// assert!(client.config().tls.is_verify_enabled());
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ReqwestClient>,
    config: Arc<ClientConfig>,
    cookie_jar: Option<Arc<CookieJar>>,
}

impl Client {
    /// Create a client with default settings
    ///
    /// Proxies come from the environment, see [`EnvProxyResolver`].
    pub fn new() -> Result<Self> {
        let env_proxy = ProxySettings::new(HashMap::new(), Arc::new(EnvProxyResolver::from_env()));
        let builder = TlsConfig::default().apply_to_builder(ReqwestClient::builder());
        let inner = env_proxy.apply_to_builder(builder).build()?;
        Ok(Self::from_reqwest(inner))
    }

    /// Wrap a caller-managed reqwest client
    ///
    /// reqwest does not expose how a client was built, so [`Client::config`]
    /// reports the default settings for it, whatever the client really does.
    pub fn from_reqwest(client: ReqwestClient) -> Self {
        Self {
            inner: Arc::new(client),
            config: Arc::new(ClientConfig::default()),
            cookie_jar: None,
        }
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &ReqwestClient {
        &self.inner
    }

    /// Get the settings this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the cookie jar, if one is attached
    pub fn cookie_jar(&self) -> Option<&CookieJar> {
        self.cookie_jar.as_deref()
    }

    /// Whether two handles refer to the same client instance
    pub fn ptr_eq(&self, other: &Client) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Chooses the client a request is executed with
///
/// Holds the default client, which is shared by every request that does not
/// override a transport setting. Requests that do get a dedicated client,
/// built from their options.
#[derive(Clone)]
pub struct ClientBuilder {
    default_client: Client,
    env_proxy: Arc<dyn ProxyResolver>,
}

impl ClientBuilder {
    /// Create a builder with a fresh default client and the environment's
    /// proxy settings
    pub fn new() -> Result<Self> {
        Ok(Self::with_default_client(Client::new()?))
    }

    /// Create a builder around an existing default client
    pub fn with_default_client(default_client: Client) -> Self {
        Self {
            default_client,
            env_proxy: Arc::new(EnvProxyResolver::from_env()),
        }
    }

    /// Replace the resolver consulted when no proxy override applies
    pub fn proxy_resolver(mut self, resolver: Arc<dyn ProxyResolver>) -> Self {
        self.env_proxy = resolver;
        self
    }

    /// The shared default client
    pub fn default_client(&self) -> &Client {
        &self.default_client
    }

    /// Select or build the client for a request
    ///
    /// An explicit `http_client` in the options is returned as-is. Otherwise
    /// the default client is reused unless the options override a transport
    /// setting (see [`RequestOptions::needs_dedicated_client`]).
    pub fn build_client(&self, options: &RequestOptions) -> Result<Client> {
        if let Some(client) = &options.http_client {
            return Ok(client.clone());
        }
        if !options.needs_dedicated_client() {
            tracing::trace!("reusing default client");
            return Ok(self.default_client.clone());
        }
        self.build_dedicated(options)
    }

    /// Build a new client configured from the options
    ///
    /// Unset timeouts take their defaults, and the client always carries a
    /// cookie jar, empty unless responses fill it.
    pub fn build_dedicated(&self, options: &RequestOptions) -> Result<Client> {
        let config = ClientConfig {
            tls: TlsConfig::new().verify(!options.insecure_skip_verify),
            compression: !options.disable_compression,
            timeouts: Some(TimeoutConfig::from_options(options)),
            proxies: options.proxies.clone(),
            cookie_jar: true,
        };
        tracing::debug!(?config, "building dedicated client");

        let jar = Arc::new(CookieJar::new());
        let timeouts = config.timeouts.unwrap_or_default();

        let mut builder = ReqwestClient::builder()
            .connect_timeout(timeouts.connect_timeout())
            .tcp_keepalive(timeouts.dial_keep_alive)
            .cookie_provider(jar.clone());
        builder = config.tls.apply_to_builder(builder);
        builder = ProxySettings::new(config.proxies.clone(), self.env_proxy.clone())
            .apply_to_builder(builder);
        if !config.compression {
            builder = builder.no_gzip().no_brotli().no_deflate();
        }

        Ok(Client {
            inner: Arc::new(builder.build()?),
            config: Arc::new(config),
            cookie_jar: Some(jar),
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("default_client", &self.default_client)
            .finish_non_exhaustive()
    }
}
