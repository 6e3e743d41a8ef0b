use std::time::Duration;

use crate::request::RequestOptions;

/// Default TLS handshake timeout of a dedicated client
pub const DEFAULT_TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default TCP connect timeout of a dedicated client
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default TCP keep-alive period of a dedicated client
pub const DEFAULT_DIAL_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Connection timeouts of a dedicated client
///
/// A zero duration in the options means "use the default", so a resolved
/// configuration never holds a zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Maximum time for the TLS handshake
    pub tls_handshake_timeout: Duration,
    /// Maximum time for the TCP connect
    pub dial_timeout: Duration,
    /// TCP keep-alive period
    pub dial_keep_alive: Duration,
}

impl TimeoutConfig {
    /// Resolve the timeouts requested by an options bag
    pub fn from_options(options: &RequestOptions) -> Self {
        Self::default()
            .tls_handshake_timeout(options.tls_handshake_timeout)
            .dial_timeout(options.dial_timeout)
            .dial_keep_alive(options.dial_keep_alive)
    }

    /// Set the TLS handshake timeout; zero keeps the current value
    pub fn tls_handshake_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.tls_handshake_timeout = timeout;
        }
        self
    }

    /// Set the connect timeout; zero keeps the current value
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.dial_timeout = timeout;
        }
        self
    }

    /// Set the keep-alive period; zero keeps the current value
    pub fn dial_keep_alive(mut self, keep_alive: Duration) -> Self {
        if !keep_alive.is_zero() {
            self.dial_keep_alive = keep_alive;
        }
        self
    }

    /// Budget for establishing a connection
    ///
    /// reqwest's connect phase spans both the TCP connect and the TLS
    /// handshake, so the two limits are added together.
    pub fn connect_timeout(&self) -> Duration {
        self.dial_timeout.saturating_add(self.tls_handshake_timeout)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            tls_handshake_timeout: DEFAULT_TLS_HANDSHAKE_TIMEOUT,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            dial_keep_alive: DEFAULT_DIAL_KEEP_ALIVE,
        }
    }
}
