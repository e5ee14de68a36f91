use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::acquisition::Credentials;
use crate::logging::LoggingConfig;

/// Remote CDP endpoint used when a browserless token is configured
pub const DEFAULT_REMOTE_BROWSER_ENDPOINT: &str = "wss://chrome.browserless.io";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub acquisition: AcquisitionConfig,
    pub export: ExportConfig,
    #[cfg(feature = "api")]
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Settings for the strategy orchestrator and its strategies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    pub request_timeout_seconds: u64,
    /// Upper bound for one strategy attempt, delays and interactions included
    pub attempt_timeout_seconds: u64,
    pub min_content_chars: usize,
    pub cooldown_ms: u64,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    pub enable_browser: bool,
    pub remote_browser_endpoint: String,
    #[serde(default, skip_serializing)]
    pub remote_browser_token: Option<String>,
    pub selector_wait_ms: u64,
    pub viewport_width: i32,
    pub viewport_height: i32,
    pub scroll_steps: u32,
    pub scroll_distance_px: u32,
    pub scroll_pause_ms: u64,
    pub max_expand_clicks: u32,
    pub user_agents: Vec<String>,
    pub login: LoginConfig,
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

/// Login form used by the authenticated browser strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    pub url: String,
    pub username_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub default_format: String,
    pub output_directory: PathBuf,
}

#[cfg(feature = "api")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size_mb: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            attempt_timeout_seconds: 90,
            min_content_chars: 1000,
            cooldown_ms: 2000,
            delay_min_ms: 1000,
            delay_max_ms: 4000,
            enable_browser: true,
            remote_browser_endpoint: DEFAULT_REMOTE_BROWSER_ENDPOINT.to_string(),
            remote_browser_token: None,
            selector_wait_ms: 10_000,
            viewport_width: 1920,
            viewport_height: 1080,
            scroll_steps: 6,
            scroll_distance_px: 1200,
            scroll_pause_ms: 500,
            max_expand_clicks: 5,
            user_agents: Vec::new(),
            login: LoginConfig::default(),
            credentials: None,
        }
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            url: "https://www.linkedin.com/login".to_string(),
            username_selector: "#username".to_string(),
            password_selector: "#password".to_string(),
            submit_selector: "button[type=\"submit\"]".to_string(),
            settle_ms: 3000,
        }
    }
}

impl AcquisitionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_seconds)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Full websocket endpoint for the remote browser, when a token is set
    pub fn remote_browser_url(&self) -> Option<String> {
        self.remote_browser_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(|token| format!("{}?token={}", self.remote_browser_endpoint, token))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = get_data_directory();

        Self {
            acquisition: AcquisitionConfig::default(),
            export: ExportConfig {
                default_format: "xlsx".to_string(),
                output_directory: data_dir.join("exports"),
            },
            #[cfg(feature = "api")]
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                max_request_size_mb: 10,
            },
            logging: LoggingConfig {
                log_directory: data_dir.join("logs"),
                ..LoggingConfig::default()
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, then apply environment overrides
    pub async fn load() -> Result<Self> {
        let config_path = get_config_path();

        let mut config = if config_path.exists() {
            Self::read_file(&config_path).await?
        } else {
            info!("No configuration file found, using defaults");
            Self::default()
        };

        ConfigOverrides::apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file, then apply environment overrides
    pub async fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let mut config = Self::read_file(path.as_ref()).await?;
        ConfigOverrides::apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    async fn read_file(path: &std::path::Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        info!("Configuration loaded from: {}", path.display());
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let acquisition = &self.acquisition;

        if acquisition.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("acquisition.request_timeout_seconds must be > 0"));
        }

        if acquisition.attempt_timeout_seconds < acquisition.request_timeout_seconds {
            return Err(anyhow::anyhow!(
                "acquisition.attempt_timeout_seconds must be >= request_timeout_seconds"
            ));
        }

        if acquisition.delay_min_ms > acquisition.delay_max_ms {
            return Err(anyhow::anyhow!("acquisition.delay_min_ms must be <= delay_max_ms"));
        }

        if acquisition.viewport_width <= 0 || acquisition.viewport_height <= 0 {
            return Err(anyhow::anyhow!("acquisition viewport must be positive"));
        }

        if acquisition.scroll_steps > 50 {
            return Err(anyhow::anyhow!("acquisition.scroll_steps must be <= 50"));
        }

        if acquisition.login.url.is_empty() {
            return Err(anyhow::anyhow!("acquisition.login.url must not be empty"));
        }

        #[cfg(feature = "api")]
        {
            if self.api.port == 0 {
                return Err(anyhow::anyhow!("API port must be > 0"));
            }
        }

        debug!("Configuration validation passed");
        Ok(())
    }
}

/// Get the default data directory
fn get_data_directory() -> PathBuf {
    directories::ProjectDirs::from("com", "profileharvester", "profile-harvester")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default().join("data"))
}

/// Get the configuration file path
fn get_config_path() -> PathBuf {
    directories::ProjectDirs::from("com", "profileharvester", "profile-harvester")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default().join("config.toml"))
}

/// Environment-based configuration overrides
pub struct ConfigOverrides;

impl ConfigOverrides {
    /// Apply environment variable overrides to configuration
    pub fn apply(config: &mut AppConfig) {
        Self::apply_from(config, |key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`
    pub fn apply_from<F>(config: &mut AppConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let acquisition = &mut config.acquisition;

        // Browser toggles
        if lookup("PH_DISABLE_BROWSER").as_deref() == Some("1")
            || lookup("DISABLE_PLAYWRIGHT").as_deref() == Some("1")
            || lookup("USE_PLAYWRIGHT").as_deref() == Some("0")
        {
            acquisition.enable_browser = false;
        }

        if let Some(token) = lookup("BROWSERLESS_API_KEY").filter(|t| !t.is_empty()) {
            acquisition.remote_browser_token = Some(token);
        }

        if let Some(timeout) = lookup("PH_REQUEST_TIMEOUT").and_then(|v| v.parse::<u64>().ok()) {
            acquisition.request_timeout_seconds = timeout;
            acquisition.attempt_timeout_seconds = acquisition.attempt_timeout_seconds.max(timeout);
        }

        if let Some(cooldown) = lookup("PH_COOLDOWN_MS").and_then(|v| v.parse::<u64>().ok()) {
            acquisition.cooldown_ms = cooldown;
        }

        if let Some(min_chars) = lookup("PH_MIN_CONTENT_CHARS").and_then(|v| v.parse::<usize>().ok()) {
            acquisition.min_content_chars = min_chars;
        }

        // Credentials only ever come from the environment
        if let (Some(username), Some(password)) =
            (lookup("PH_LINKEDIN_EMAIL"), lookup("PH_LINKEDIN_PASSWORD"))
        {
            if !username.is_empty() && !password.is_empty() {
                acquisition.credentials = Some(Credentials::new(username, password));
            }
        }

        // Export overrides
        if let Some(dir) = lookup("PH_EXPORT_DIR") {
            config.export.output_directory = PathBuf::from(dir);
        }

        // API overrides
        #[cfg(feature = "api")]
        {
            if let Some(api_host) = lookup("PH_API_HOST") {
                config.api.host = api_host;
            }

            if let Some(api_port) = lookup("PH_API_PORT").and_then(|v| v.parse::<u16>().ok()) {
                config.api.port = api_port;
            }
        }

        // Logging overrides
        if let Some(log_level) = lookup("PH_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        debug!("Applied environment variable overrides");
    }
}
