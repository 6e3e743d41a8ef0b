use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use ipnet::IpNet;
use reqwest::{ClientBuilder as ReqwestBuilder, Proxy as ReqwestProxy};
use url::Url;

/// Source of the ambient proxy for a request URL
pub trait ProxyResolver: Send + Sync {
    /// The proxy to use for `url`, or `None` to connect directly
    fn proxy_for(&self, url: &Url) -> Option<Url>;
}

/// Proxy configuration read from the process environment
///
/// Uses `HTTP_PROXY`/`http_proxy` for `http` URLs, `HTTPS_PROXY`/`https_proxy`
/// for `https` URLs, and skips hosts and address ranges listed in
/// `NO_PROXY`/`no_proxy`.
/// Localhost and loopback addresses always connect directly.
#[derive(Debug, Clone, Default)]
pub struct EnvProxyResolver {
    http_proxy: Option<Url>,
    https_proxy: Option<Url>,
    no_proxy: Vec<String>,
}

impl EnvProxyResolver {
    /// Create a resolver with no proxies configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver from the current environment variables
    pub fn from_env() -> Self {
        let mut resolver = Self::new();
        resolver.http_proxy = env_var(&["HTTP_PROXY", "http_proxy"]).and_then(|v| parse_proxy(&v));
        resolver.https_proxy =
            env_var(&["HTTPS_PROXY", "https_proxy"]).and_then(|v| parse_proxy(&v));
        if let Some(no_proxy) = env_var(&["NO_PROXY", "no_proxy"]) {
            resolver = resolver.no_proxy(&no_proxy);
        }
        resolver
    }

    /// Set the proxy for `http` URLs
    pub fn http_proxy(mut self, url: Url) -> Self {
        self.http_proxy = Some(url);
        self
    }

    /// Set the proxy for `https` URLs
    pub fn https_proxy(mut self, url: Url) -> Self {
        self.https_proxy = Some(url);
        self
    }

    /// Add comma or space separated bypass entries
    pub fn no_proxy(mut self, list: &str) -> Self {
        self.no_proxy.extend(
            list.split(|c: char| c == ',' || c.is_whitespace())
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty()),
        );
        self
    }

    /// Check if a URL should bypass the proxy
    pub fn should_bypass(&self, url: &Url) -> bool {
        let host = match url.host_str() {
            Some(host) => host.trim_start_matches('[').trim_end_matches(']').to_ascii_lowercase(),
            None => return true,
        };
        if host == "localhost" {
            return true;
        }
        let host_ip = host.parse::<IpAddr>().ok();
        if host_ip.map_or(false, |ip| ip.is_loopback()) {
            return true;
        }

        self.no_proxy.iter().any(|entry| {
            if entry == "*" {
                return true;
            }
            if let Ok(net) = entry.parse::<IpNet>() {
                return host_ip.map_or(false, |ip| net.contains(&ip));
            }
            // Entries may carry a port; it has to match when present.
            let (pattern, port) = split_port(entry);
            if let Some(port) = port {
                if url.port_or_known_default() != Some(port) {
                    return false;
                }
            }
            let pattern = pattern.trim_start_matches('.');
            host == pattern || host.ends_with(&format!(".{}", pattern))
        })
    }
}

impl ProxyResolver for EnvProxyResolver {
    fn proxy_for(&self, url: &Url) -> Option<Url> {
        if self.should_bypass(url) {
            return None;
        }
        match url.scheme() {
            "http" => self.http_proxy.clone(),
            "https" => self.https_proxy.clone(),
            _ => None,
        }
    }
}

/// Per-scheme proxy overrides layered over an ambient resolver
#[derive(Clone)]
pub struct ProxySettings {
    proxies: HashMap<String, Url>,
    fallback: Arc<dyn ProxyResolver>,
}

impl ProxySettings {
    /// Create settings from a scheme → proxy map
    pub fn new(proxies: HashMap<String, Url>, fallback: Arc<dyn ProxyResolver>) -> Self {
        Self { proxies, fallback }
    }

    /// Resolve the proxy for one request URL
    ///
    /// A map entry for the URL's scheme wins; anything else, including an
    /// empty map, falls back to the ambient resolver.
    pub fn resolve(&self, url: &Url) -> Option<Url> {
        match self.proxies.get(url.scheme()) {
            Some(proxy) => Some(proxy.clone()),
            None => self.fallback.proxy_for(url),
        }
    }

    /// Apply this configuration to a reqwest client builder
    pub fn apply_to_builder(self, builder: ReqwestBuilder) -> ReqwestBuilder {
        let proxy = ReqwestProxy::custom(move |url| {
            let resolved = self.resolve(url);
            tracing::trace!(%url, proxy = ?resolved.as_ref().map(Url::as_str), "resolved proxy");
            resolved
        });
        builder.proxy(proxy)
    }
}

impl fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxySettings")
            .field("proxies", &self.proxies)
            .finish_non_exhaustive()
    }
}

fn env_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Parse a proxy address, assuming `http://` when no scheme is given
fn parse_proxy(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) if url.has_host() => Some(url),
        _ => Url::parse(&format!("http://{}", raw)).ok(),
    }
}

fn split_port(entry: &str) -> (&str, Option<u16>) {
    match entry.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(port) => (host, Some(port)),
            Err(_) => (entry, None),
        },
        _ => (entry, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver(Option<Url>);

    impl ProxyResolver for FixedResolver {
        fn proxy_for(&self, _url: &Url) -> Option<Url> {
            self.0.clone()
        }
    }

    fn url(s: &str) -> Url {
        s.parse().unwrap()
    }

    #[test]
    fn test_scheme_match_wins() {
        let mut map = HashMap::new();
        map.insert("http".to_string(), url("http://proxy-a:8080"));
        let settings = ProxySettings::new(map, Arc::new(FixedResolver(Some(url("http://env:3128")))));

        assert_eq!(settings.resolve(&url("http://example.com/")), Some(url("http://proxy-a:8080")));
    }

    #[test]
    fn test_uncovered_scheme_falls_back_to_environment() {
        let mut map = HashMap::new();
        map.insert("http".to_string(), url("http://proxy-a:8080"));
        let settings = ProxySettings::new(map, Arc::new(FixedResolver(Some(url("http://env:3128")))));

        assert_eq!(settings.resolve(&url("https://example.com/")), Some(url("http://env:3128")));
    }

    #[test]
    fn test_empty_map_uses_environment() {
        let settings = ProxySettings::new(HashMap::new(), Arc::new(FixedResolver(None)));
        assert_eq!(settings.resolve(&url("http://example.com/")), None);
    }

    #[test]
    fn test_env_resolver_by_scheme() {
        let resolver = EnvProxyResolver::new()
            .http_proxy(url("http://plain:80"))
            .https_proxy(url("http://secure:443"));

        assert_eq!(resolver.proxy_for(&url("http://example.com")), Some(url("http://plain:80")));
        assert_eq!(resolver.proxy_for(&url("https://example.com")), Some(url("http://secure:443")));
        assert_eq!(resolver.proxy_for(&url("ftp://example.com")), None);
    }

    #[test]
    fn test_env_resolver_bypass() {
        let resolver = EnvProxyResolver::new()
            .http_proxy(url("http://plain:80"))
            .no_proxy("internal.corp, .example.org,api.test:8443");

        assert!(resolver.should_bypass(&url("http://localhost:3000")));
        assert!(resolver.should_bypass(&url("http://127.0.0.1:3000")));
        assert!(resolver.should_bypass(&url("http://[::1]:3000")));
        assert!(resolver.should_bypass(&url("http://internal.corp/")));
        assert!(resolver.should_bypass(&url("http://a.internal.corp/")));
        assert!(resolver.should_bypass(&url("http://www.example.org/")));
        assert!(resolver.should_bypass(&url("https://api.test:8443/")));
        assert!(!resolver.should_bypass(&url("https://api.test/")));
        assert!(!resolver.should_bypass(&url("http://notinternal.corp/")));
        assert_eq!(resolver.proxy_for(&url("http://www.example.org/")), None);
    }

    #[test]
    fn test_env_resolver_bypasses_ip_ranges() {
        let resolver = EnvProxyResolver::new()
            .http_proxy(url("http://plain:80"))
            .no_proxy("10.0.0.0/8, fd00::/8");

        assert_eq!(resolver.proxy_for(&url("http://10.1.2.3/")), None);
        assert_eq!(resolver.proxy_for(&url("http://[fd12::1]/")), None);
        assert_eq!(resolver.proxy_for(&url("http://11.0.0.1/")), Some(url("http://plain:80")));
        assert_eq!(resolver.proxy_for(&url("http://example.com/")), Some(url("http://plain:80")));
    }

    #[test]
    fn test_wildcard_bypasses_everything() {
        let resolver = EnvProxyResolver::new()
            .http_proxy(url("http://plain:80"))
            .no_proxy("*");
        assert_eq!(resolver.proxy_for(&url("http://example.com")), None);
    }

    #[test]
    fn test_parse_proxy_without_scheme() {
        assert_eq!(parse_proxy("proxy.local:3128"), Some(url("http://proxy.local:3128")));
        assert_eq!(parse_proxy("socks5://proxy.local:1080"), Some(url("socks5://proxy.local:1080")));
    }
}
