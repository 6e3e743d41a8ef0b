use reqwest::ClientBuilder as ReqwestBuilder;

/// TLS settings of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsConfig {
    /// Whether to verify the server certificate
    pub verify: bool,
}

impl TlsConfig {
    /// Create a configuration that verifies certificates
    pub fn new() -> Self {
        Self { verify: true }
    }

    /// Create a configuration that accepts invalid certificates
    pub fn insecure() -> Self {
        Self { verify: false }
    }

    /// Set certificate verification
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Check if certificate verification is enabled
    pub fn is_verify_enabled(&self) -> bool {
        self.verify
    }

    /// Apply this configuration to a reqwest client builder
    pub fn apply_to_builder(self, builder: ReqwestBuilder) -> ReqwestBuilder {
        // Turns off chain and host name validation together.
        builder
            .use_rustls_tls()
            .danger_accept_invalid_certs(!self.verify)
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self::new()
    }
}
