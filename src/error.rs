use thiserror::Error;

/// Error taxonomy for acquisition, extraction and export
#[derive(Error, Debug)]
pub enum ScrapeError {
    // Request errors
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid {platform} URL: {url}")]
    InvalidUrl { platform: String, url: String },

    // Acquisition errors
    #[error("Failed to acquire {url} after {attempts} attempt(s): {last_error}")]
    AcquisitionFailed {
        url: String,
        attempts: usize,
        last_error: String,
    },

    #[error("Content too short: {length} chars (need more than {minimum})")]
    ContentTooShort { length: usize, minimum: usize },

    #[error("HTTP request failed: {url} - {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Timed out after {after_ms}ms: {operation}")]
    Timeout { operation: String, after_ms: u64 },

    #[error("Browser error: {message}")]
    Browser { message: String },

    #[error("Login failed: {message}")]
    LoginFailed { message: String },

    // Export errors
    #[error("Export failed: {message}")]
    ExportFailed { message: String },

    // System errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ScrapeError {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    /// Create an invalid URL error
    pub fn invalid_url(platform: impl Into<String>, url: impl Into<String>) -> Self {
        Self::InvalidUrl {
            platform: platform.into(),
            url: url.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Create a browser error
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser { message: message.into() }
    }

    /// Create a login error
    pub fn login(message: impl Into<String>) -> Self {
        Self::LoginFailed { message: message.into() }
    }

    /// Create an export error
    pub fn export(message: impl Into<String>) -> Self {
        Self::ExportFailed { message: message.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether the orchestrator may move on to the next strategy after this error.
    ///
    /// Request-level errors abort immediately; everything a single strategy can
    /// hit is local to that strategy.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ContentTooShort { .. }
            | Self::HttpStatus { .. }
            | Self::Network { .. }
            | Self::Timeout { .. }
            | Self::Browser { .. }
            | Self::LoginFailed { .. } => true,

            Self::InvalidInput { .. }
            | Self::InvalidUrl { .. }
            | Self::AcquisitionFailed { .. }
            | Self::ExportFailed { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } | Self::InvalidUrl { .. } => "input",
            Self::AcquisitionFailed { .. } | Self::ContentTooShort { .. } => "acquisition",
            Self::HttpStatus { .. } | Self::Network { .. } | Self::Timeout { .. } => "network",
            Self::Browser { .. } | Self::LoginFailed { .. } => "browser",
            Self::ExportFailed { .. } => "export",
            Self::Configuration { .. } => "configuration",
            Self::Internal { .. } => "internal",
        }
    }

    /// Transport status used by the HTTP API
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } | Self::InvalidUrl { .. } => 400,
            Self::AcquisitionFailed { .. } => 502,
            Self::Timeout { .. } => 504,
            _ => 500,
        }
    }

    /// Client input errors are surfaced verbatim and never retried
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }
}

/// Result type alias for scraping operations
pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: match err.url() {
                    Some(url) => format!("GET {}", url),
                    None => "http request".to_string(),
                },
                after_ms: 0,
            }
        } else if let Some(status) = err.status() {
            Self::HttpStatus {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            }
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<anyhow::Error> for ScrapeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal { message: err.to_string() }
    }
}
