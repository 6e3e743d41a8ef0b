use std::sync::Mutex;

use cookie::time::OffsetDateTime;
use cookie::Cookie;
use http::header::COOKIE;
use http::{HeaderMap, HeaderValue};
use url::Url;

/// Cookie jar attached to every dedicated client
///
/// Stores cookies set by responses and replays them on later requests.
/// Domain cookies are scoped with the public suffix list: a response cannot
/// set a cookie for a public suffix such as `co.uk`, so cookies never leak
/// between unrelated registrable domains.
#[derive(Debug, Default)]
pub struct CookieJar {
    inner: Mutex<Vec<StoredCookie>>,
}

#[derive(Debug, Clone)]
struct StoredCookie {
    cookie: Cookie<'static>,
    domain: String,
    host_only: bool,
    path: String,
    expires: Option<OffsetDateTime>,
}

impl StoredCookie {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires.map_or(false, |at| at <= now)
    }

    fn matches(&self, url: &Url, host: &str) -> bool {
        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_match(host, &self.domain)
        };
        domain_ok
            && path_match(url.path(), &self.path)
            && (!self.cookie.secure().unwrap_or(false) || url.scheme() == "https")
    }
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cookie as if `url` had answered with it in a `Set-Cookie` header
    ///
    /// Returns `false` if the cookie was rejected or only removed an old one.
    pub fn add_cookie_str(&self, set_cookie: &str, url: &Url) -> bool {
        let cookie = match Cookie::parse(set_cookie) {
            Ok(cookie) => cookie.into_owned(),
            Err(err) => {
                tracing::debug!(%err, "ignoring malformed Set-Cookie header");
                return false;
            }
        };
        self.store(cookie, url)
    }

    /// Cookies that would be sent to `url`, most specific path first
    pub fn cookies_for_url(&self, url: &Url) -> Vec<Cookie<'static>> {
        let host = match url.host_str() {
            Some(host) => host.to_ascii_lowercase(),
            None => return Vec::new(),
        };
        let now = OffsetDateTime::now_utc();

        let mut matching: Vec<StoredCookie> = match self.inner.lock() {
            Ok(mut jar) => {
                jar.retain(|c| !c.is_expired(now));
                jar.iter().filter(|c| c.matches(url, &host)).cloned().collect()
            }
            Err(_) => return Vec::new(),
        };
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        matching.into_iter().map(|c| c.cookie).collect()
    }

    /// Get the number of cookies in the jar
    pub fn len(&self) -> usize {
        self.inner.lock().map(|jar| jar.len()).unwrap_or(0)
    }

    /// Check if the cookie jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(&self, cookie: Cookie<'static>, url: &Url) -> bool {
        let host = match url.host_str() {
            Some(host) => host.to_ascii_lowercase(),
            None => return false,
        };

        let (domain, host_only) = match cookie.domain() {
            None => (host.clone(), true),
            Some(attr) => {
                let attr = attr.trim_start_matches('.').to_ascii_lowercase();
                if is_public_suffix(&attr) {
                    if attr != host {
                        tracing::debug!(domain = %attr, "rejecting cookie for a public suffix");
                        return false;
                    }
                    (host.clone(), true)
                } else if domain_match(&host, &attr) {
                    (attr, false)
                } else {
                    tracing::debug!(domain = %attr, %host, "rejecting cookie for a foreign domain");
                    return false;
                }
            }
        };

        let path = match cookie.path() {
            Some(path) if path.starts_with('/') => path.to_string(),
            _ => default_path(url),
        };

        let now = OffsetDateTime::now_utc();
        let expires = match cookie.max_age() {
            // Past the representable range the cookie simply never expires.
            Some(max_age) => now.checked_add(max_age),
            None => cookie.expires_datetime(),
        };

        let stored = StoredCookie {
            cookie,
            domain,
            host_only,
            path,
            expires,
        };

        let mut jar = match self.inner.lock() {
            Ok(jar) => jar,
            Err(_) => return false,
        };
        jar.retain(|c| {
            !(c.cookie.name() == stored.cookie.name()
                && c.domain == stored.domain
                && c.path == stored.path)
        });
        if stored.is_expired(now) {
            return false;
        }
        jar.push(stored);
        true
    }
}

impl reqwest::cookie::CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            if let Ok(value) = header.to_str() {
                self.add_cookie_str(value, url);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let cookies = self.cookies_for_url(url);
        if cookies.is_empty() {
            return None;
        }
        let header = cookies
            .iter()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}

/// Append cookies to the request's `Cookie` header
///
/// Values are sanitized the way browsers do; a cookie whose name still
/// cannot be sent in a header is skipped.
pub fn append_cookies(headers: &mut HeaderMap, cookies: &[Cookie<'static>]) {
    for cookie in cookies {
        let pair = format!(
            "{}={}",
            cookie.name().replace(['\r', '\n'], "-"),
            sanitize_value(cookie.value())
        );
        let combined = match headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.is_empty() => format!("{}; {}", existing, pair),
            _ => pair,
        };
        match HeaderValue::from_str(&combined) {
            Ok(value) => {
                headers.insert(COOKIE, value);
            }
            Err(_) => tracing::debug!(name = cookie.name(), "skipping unsendable cookie"),
        }
    }
}

fn sanitize_value(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|&c| (' '..='~').contains(&c) && c != '"' && c != ';' && c != '\\')
        .collect();
    if cleaned.contains(' ') || cleaned.contains(',') {
        format!("\"{}\"", cleaned)
    } else {
        cleaned
    }
}

fn is_public_suffix(domain: &str) -> bool {
    psl::suffix_str(domain) == Some(domain)
}

fn domain_match(host: &str, domain: &str) -> bool {
    if host == domain {
        return true;
    }
    host.parse::<std::net::IpAddr>().is_err()
        && host.len() > domain.len()
        && host.ends_with(domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}

fn path_match(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}
