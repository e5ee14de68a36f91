use async_trait::async_trait;
use rand::Rng;
use reqwest::{header::{HeaderMap, HeaderName, HeaderValue}, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::user_agent::{Browser, OsFamily, UserAgentRotator};
use super::{AcquisitionRequest, AcquisitionStrategy, StrategyKind};
use crate::error::{ScrapeError, ScrapeResult};

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Header set presented by one fetch identity
#[derive(Debug, Clone)]
pub struct HeaderProfile {
    pub user_agent: String,
    pub headers: Vec<(&'static str, String)>,
}

impl HeaderProfile {
    /// Realistic desktop Chrome on Windows
    pub fn desktop_browser(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            headers: vec![
                ("Accept", HTML_ACCEPT.to_string()),
                ("Accept-Language", "en-US,en;q=0.9".to_string()),
                ("Cache-Control", "max-age=0".to_string()),
                ("DNT", "1".to_string()),
                ("Upgrade-Insecure-Requests", "1".to_string()),
                ("Sec-Fetch-Dest", "document".to_string()),
                ("Sec-Fetch-Mode", "navigate".to_string()),
                ("Sec-Fetch-Site", "none".to_string()),
                ("Sec-Fetch-User", "?1".to_string()),
            ],
        }
    }

    /// Visitor arriving from a search engine results page
    pub fn search_referral(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            headers: vec![
                ("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8".to_string()),
                ("Accept-Language", "en-GB,en;q=0.8".to_string()),
                ("Referer", "https://www.google.com/".to_string()),
                ("Sec-Fetch-Site", "cross-site".to_string()),
            ],
        }
    }

    /// Bare request with only the essentials
    pub fn minimal(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            headers: vec![
                ("Accept", "text/html,*/*;q=0.8".to_string()),
                ("Accept-Language", "en-US,en;q=0.5".to_string()),
            ],
        }
    }

    fn header_map(&self) -> ScrapeResult<HeaderMap> {
        let mut map = HeaderMap::new();
        map.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|e| ScrapeError::invalid_input(format!("Invalid user agent: {}", e)))?,
        );

        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScrapeError::invalid_input(format!("Invalid header {}: {}", key, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ScrapeError::invalid_input(format!("Invalid header value for {}: {}", key, e)))?;
            map.insert(name, value);
        }

        Ok(map)
    }
}

/// Single-use HTTP client; one per strategy call so cookies never leak across requests
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> ScrapeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ScrapeError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET the page with the given identity; non-2xx statuses are errors
    pub async fn get(&self, url: &Url, profile: &HeaderProfile) -> ScrapeResult<String> {
        debug!("HTTP GET {} as {}", url, profile.user_agent);

        let response = self
            .client
            .get(url.clone())
            .headers(profile.header_map()?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!("HTTP GET {} returned {} bytes", url, body.len());
        Ok(body)
    }
}

async fn fetch_with(request: &AcquisitionRequest, profile: HeaderProfile) -> ScrapeResult<String> {
    let url = request.parsed_url()?;
    HttpFetcher::new(request.timeout)?.get(&url, &profile).await
}

/// Direct fetch with a realistic desktop browser header set
pub struct HeaderedFetchStrategy {
    user_agents: Arc<UserAgentRotator>,
}

impl HeaderedFetchStrategy {
    pub fn new(user_agents: Arc<UserAgentRotator>) -> Self {
        Self { user_agents }
    }
}

#[async_trait]
impl AcquisitionStrategy for HeaderedFetchStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::HeaderedFetch
    }

    async fn fetch(&self, request: &AcquisitionRequest) -> ScrapeResult<String> {
        let ua = self
            .user_agents
            .get_random_user_agent_for(Some(Browser::Chrome), Some(OsFamily::Windows));
        fetch_with(request, HeaderProfile::desktop_browser(ua)).await
    }
}

/// Direct fetch posing as a macOS visitor referred by a search engine
pub struct AlternateIdentityStrategy {
    user_agents: Arc<UserAgentRotator>,
}

impl AlternateIdentityStrategy {
    pub fn new(user_agents: Arc<UserAgentRotator>) -> Self {
        Self { user_agents }
    }
}

#[async_trait]
impl AcquisitionStrategy for AlternateIdentityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AlternateIdentityFetch
    }

    async fn fetch(&self, request: &AcquisitionRequest) -> ScrapeResult<String> {
        let ua = self.user_agents.get_random_user_agent_for(None, Some(OsFamily::MacOS));
        fetch_with(request, HeaderProfile::search_referral(ua)).await
    }
}

/// Direct fetch after a random pause, to break up request timing patterns
pub struct DelayedFetchStrategy {
    user_agents: Arc<UserAgentRotator>,
    delay_min_ms: u64,
    delay_max_ms: u64,
}

impl DelayedFetchStrategy {
    pub fn new(user_agents: Arc<UserAgentRotator>, delay_min_ms: u64, delay_max_ms: u64) -> Self {
        Self {
            user_agents,
            delay_min_ms: delay_min_ms.min(delay_max_ms),
            delay_max_ms: delay_max_ms.max(delay_min_ms),
        }
    }

    fn pick_delay(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.delay_min_ms..=self.delay_max_ms);
        Duration::from_millis(ms)
    }
}

#[async_trait]
impl AcquisitionStrategy for DelayedFetchStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DelayedFetch
    }

    async fn fetch(&self, request: &AcquisitionRequest) -> ScrapeResult<String> {
        let delay = self.pick_delay();
        debug!("Delaying fetch of {} by {}ms", request.target_url, delay.as_millis());
        tokio::time::sleep(delay).await;

        let ua = self.user_agents.get_random_user_agent_for(None, Some(OsFamily::Linux));
        fetch_with(request, HeaderProfile::minimal(ua)).await
    }
}
