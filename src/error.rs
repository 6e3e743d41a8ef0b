use thiserror::Error;

/// Result type for easyreq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for easyreq
///
/// Nothing in this crate retries or reclassifies failures: every variant is
/// handed straight back to the caller of the failing operation.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request URL or query string
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON or XML body serialization failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A required input was missing, e.g. a file upload without a stream
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reading an upload stream failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header name or value rejected while building the options bag
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Network, DNS or TLS failure reported by the transport, passed through as-is
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl Error {
    /// Create a new encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Error::Encoding(message.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    /// Check if this is a URL parse error
    pub fn is_url(&self) -> bool {
        matches!(self, Error::Url(_))
    }

    /// Check if this is an encoding error
    pub fn is_encoding(&self) -> bool {
        matches!(self, Error::Encoding(_))
    }

    /// Check if this is an invalid input error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// Check if this is an upload IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Check if this error came from the transport
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Get the underlying reqwest error if this is a transport error
    pub fn as_transport_error(&self) -> Option<&reqwest::Error> {
        match self {
            Error::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Error::InvalidHeader(format!("Invalid header name: {}", err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::InvalidHeader(format!("Invalid header value: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(format!("JSON: {}", err))
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Error::Encoding(format!("XML: {}", err))
    }
}
