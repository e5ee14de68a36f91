//! Headless browser strategies (Playwright).

use async_trait::async_trait;
use playwright::api::{Browser, DocumentLoadState, Page, Viewport};
use playwright::Playwright;
use std::time::Duration;
use tracing::{debug, warn};

use super::user_agent::{Browser as UaBrowser, OsFamily, UserAgentRotator};
use super::{AcquisitionRequest, AcquisitionStrategy, Credentials, StrategyKind};
use crate::config::{AcquisitionConfig, LoginConfig};
use crate::error::{ScrapeError, ScrapeResult};

/// Button labels clicked to expand collapsed sections
const EXPAND_LABELS: [&str; 3] = ["show all", "see more", "show more"];

/// Time kept back from the attempt timeout so the browser can still be closed
const CLOSE_MARGIN: Duration = Duration::from_secs(5);

/// Browser session settings shared by both browser strategies
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub user_agent: String,
    pub viewport_width: i32,
    pub viewport_height: i32,
    pub remote_endpoint: Option<String>,
    pub selector_wait: Duration,
    pub scroll_steps: u32,
    pub scroll_distance_px: u32,
    pub scroll_pause: Duration,
    pub max_expand_clicks: u32,
    pub attempt_timeout: Duration,
}

impl BrowserSettings {
    pub fn from_config(config: &AcquisitionConfig) -> Self {
        let rotator = UserAgentRotator::new(&config.user_agents);
        Self {
            user_agent: rotator.get_random_user_agent_for(Some(UaBrowser::Chrome), Some(OsFamily::Windows)),
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            remote_endpoint: config.remote_browser_url(),
            selector_wait: Duration::from_millis(config.selector_wait_ms),
            scroll_steps: config.scroll_steps,
            scroll_distance_px: config.scroll_distance_px,
            scroll_pause: Duration::from_millis(config.scroll_pause_ms),
            max_expand_clicks: config.max_expand_clicks,
            attempt_timeout: config.attempt_timeout(),
        }
    }

    /// Time budget for one render: navigation, selector wait and interactions
    fn render_budget(&self, request: &AcquisitionRequest) -> Duration {
        request.timeout + self.selector_wait + self.scroll_pause * (self.scroll_steps + 2)
    }

    /// Bound a session budget so it always ends before the orchestrator's attempt timeout
    fn session_budget(&self, wanted: Duration) -> Duration {
        wanted.min(self.attempt_timeout.saturating_sub(CLOSE_MARGIN))
    }
}

fn browser_error(e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::browser(e.to_string())
}

/// A launched (or remotely connected) browser; the driver lives as long as the session
struct BrowserSession {
    _playwright: Playwright,
    browser: Browser,
}

impl BrowserSession {
    async fn open(settings: &BrowserSettings) -> ScrapeResult<Self> {
        let playwright = Playwright::initialize().await.map_err(browser_error)?;
        let chromium = playwright.chromium();

        let browser = match &settings.remote_endpoint {
            Some(endpoint) => {
                debug!("Connecting to remote browser");
                chromium
                    .connect_over_cdp_builder(endpoint)
                    .timeout(settings.selector_wait.as_millis() as f64 * 3.0)
                    .connect_over_cdp()
                    .await
                    .map_err(browser_error)?
            }
            None => {
                debug!("Launching local headless Chromium");
                chromium
                    .launcher()
                    .headless(true)
                    .launch()
                    .await
                    .map_err(browser_error)?
            }
        };

        Ok(Self {
            _playwright: playwright,
            browser,
        })
    }

    async fn new_page(&self, settings: &BrowserSettings) -> ScrapeResult<Page> {
        let context = self
            .browser
            .context_builder()
            .user_agent(&settings.user_agent)
            .viewport(Some(Viewport {
                width: settings.viewport_width,
                height: settings.viewport_height,
            }))
            .build()
            .await
            .map_err(browser_error)?;

        context.new_page().await.map_err(browser_error)
    }

    async fn close(self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
    }
}

/// Run `work` against a fresh session, closing the browser on every exit path.
///
/// Launch, page setup and `work` share one deadline, capped below the attempt timeout.
async fn with_session<F, Fut>(settings: &BrowserSettings, budget: Duration, work: F) -> ScrapeResult<String>
where
    F: FnOnce(Page) -> Fut,
    Fut: std::future::Future<Output = ScrapeResult<String>>,
{
    let budget = settings.session_budget(budget);
    let deadline = tokio::time::Instant::now() + budget;
    let timed_out = || ScrapeError::Timeout {
        operation: "browser render".to_string(),
        after_ms: budget.as_millis() as u64,
    };

    let session = match tokio::time::timeout_at(deadline, BrowserSession::open(settings)).await {
        Ok(session) => session?,
        Err(_) => return Err(timed_out()),
    };

    let rendered = async {
        let page = session.new_page(settings).await?;
        work(page).await
    };
    let result = match tokio::time::timeout_at(deadline, rendered).await {
        Ok(result) => result,
        Err(_) => Err(timed_out()),
    };

    session.close().await;
    result
}

/// Navigate to the target, wait, expand and scroll, then return the rendered HTML
async fn render_target(page: &Page, settings: &BrowserSettings, request: &AcquisitionRequest) -> ScrapeResult<String> {
    page.goto_builder(&request.target_url)
        .timeout(request.timeout.as_millis() as f64)
        .wait_until(DocumentLoadState::DomContentLoaded)
        .goto()
        .await
        .map_err(browser_error)?;

    if let Some(selector) = &request.wait_selector {
        // A missing selector is not fatal; the page may still carry usable markup
        if let Err(e) = page
            .wait_for_selector_builder(selector)
            .timeout(settings.selector_wait.as_millis() as f64)
            .wait_for_selector()
            .await
        {
            debug!("Selector {} did not appear: {}", selector, e);
        }
    }

    expand_sections(page, settings).await;
    scroll_page(page, settings).await;

    page.content().await.map_err(browser_error)
}

async fn expand_sections(page: &Page, settings: &BrowserSettings) {
    if settings.max_expand_clicks == 0 {
        return;
    }

    let labels = EXPAND_LABELS
        .iter()
        .map(|label| format!("'{}'", label))
        .collect::<Vec<_>>()
        .join(",");
    let script = format!(
        "(() => {{ const labels = [{}]; let clicked = 0; \
         for (const el of document.querySelectorAll('button, a[role=\"button\"], div[role=\"button\"]')) {{ \
           if (clicked >= {}) break; \
           const text = (el.innerText || '').trim().toLowerCase(); \
           if (el.offsetParent !== null && labels.some(l => text.startsWith(l))) {{ el.click(); clicked++; }} \
         }} return clicked; }})()",
        labels, settings.max_expand_clicks
    );

    match page.evaluate::<(), serde_json::Value>(&script, ()).await {
        Ok(clicked) => {
            debug!("Expanded {} section(s)", clicked);
            if clicked.as_u64().unwrap_or(0) > 0 {
                tokio::time::sleep(settings.scroll_pause).await;
            }
        }
        Err(e) => debug!("Expanding sections failed: {}", e),
    }
}

async fn scroll_page(page: &Page, settings: &BrowserSettings) {
    let script = format!("window.scrollBy(0, {})", settings.scroll_distance_px);
    for step in 0..settings.scroll_steps {
        if let Err(e) = page.evaluate::<(), serde_json::Value>(&script, ()).await {
            debug!("Scroll step {} failed: {}", step + 1, e);
            break;
        }
        tokio::time::sleep(settings.scroll_pause).await;
    }
}

/// Full browser rendering of the target page
pub struct BrowserRenderStrategy {
    settings: BrowserSettings,
}

impl BrowserRenderStrategy {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl AcquisitionStrategy for BrowserRenderStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BrowserRender
    }

    async fn fetch(&self, request: &AcquisitionRequest) -> ScrapeResult<String> {
        let settings = &self.settings;
        with_session(settings, settings.render_budget(request), |page| async move {
            render_target(&page, settings, request).await
        })
        .await
    }
}

/// Browser rendering preceded by a form login
pub struct AuthenticatedBrowserStrategy {
    settings: BrowserSettings,
    login: LoginConfig,
}

impl AuthenticatedBrowserStrategy {
    pub fn new(settings: BrowserSettings, login: LoginConfig) -> Self {
        Self { settings, login }
    }

    async fn log_in(&self, page: &Page, credentials: &Credentials, timeout: Duration) -> ScrapeResult<()> {
        let login = &self.login;
        let login_error = |e: std::sync::Arc<playwright::Error>| ScrapeError::login(e.to_string());

        page.goto_builder(&login.url)
            .timeout(timeout.as_millis() as f64)
            .goto()
            .await
            .map_err(login_error)?;

        page.fill_builder(&login.username_selector, credentials.username())
            .fill()
            .await
            .map_err(login_error)?;
        page.fill_builder(&login.password_selector, credentials.password())
            .fill()
            .await
            .map_err(login_error)?;
        page.click_builder(&login.submit_selector)
            .click()
            .await
            .map_err(login_error)?;

        self.wait_for_settle(page).await;

        let location = page
            .evaluate::<(), serde_json::Value>("window.location.href", ())
            .await
            .map_err(login_error)?;
        let location = location.as_str().unwrap_or_default();
        if location.contains("/login") || location.contains("/checkpoint") {
            return Err(ScrapeError::login(format!("still on {} after submitting credentials", location)));
        }

        debug!("Login completed");
        Ok(())
    }

    /// Poll until the document reports complete, bounded by the settle window
    async fn wait_for_settle(&self, page: &Page) {
        let settle = Duration::from_millis(self.login.settle_ms);
        let deadline = tokio::time::Instant::now() + settle;
        let poll = Duration::from_millis(250);

        tokio::time::sleep(poll).await;
        while tokio::time::Instant::now() < deadline {
            match page
                .evaluate::<(), serde_json::Value>("document.readyState", ())
                .await
            {
                Ok(state) if state.as_str() == Some("complete") => break,
                Ok(_) => tokio::time::sleep(poll).await,
                Err(_) => tokio::time::sleep(poll).await,
            }
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for AuthenticatedBrowserStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AuthenticatedBrowser
    }

    async fn fetch(&self, request: &AcquisitionRequest) -> ScrapeResult<String> {
        let credentials = request
            .credentials
            .as_ref()
            .ok_or_else(|| ScrapeError::login("no credentials supplied"))?;

        let settings = &self.settings;
        let budget = settings.render_budget(request) + request.timeout + Duration::from_millis(self.login.settle_ms);
        with_session(settings, budget, |page| async move {
            self.log_in(&page, credentials, request.timeout).await?;
            render_target(&page, settings, request).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    #[test]
    fn test_settings_follow_config() {
        let mut config = AcquisitionConfig::default();
        config.remote_browser_token = Some("tok".to_string());
        config.scroll_steps = 3;

        let settings = BrowserSettings::from_config(&config);
        assert_eq!(settings.viewport_width, 1920);
        assert_eq!(settings.scroll_steps, 3);
        assert!(settings.remote_endpoint.as_deref().unwrap_or_default().ends_with("?token=tok"));
        assert!(settings.user_agent.contains("Windows NT"));
    }

    #[test]
    fn test_render_budget_covers_interactions() {
        let settings = BrowserSettings::from_config(&AcquisitionConfig::default());
        let request = AcquisitionRequest::new("https://www.facebook.com/acme", Platform::Facebook)
            .with_timeout(Duration::from_secs(30));

        // 30s navigation + 10s selector wait + 8 x 500ms pauses
        assert_eq!(settings.render_budget(&request), Duration::from_secs(44));
    }

    #[test]
    fn test_session_budget_ends_before_attempt_timeout() {
        let mut config = AcquisitionConfig::default();
        config.request_timeout_seconds = 30;
        config.attempt_timeout_seconds = 30;
        let settings = BrowserSettings::from_config(&config);
        let request = AcquisitionRequest::new("https://www.linkedin.com/in/jdoe", Platform::LinkedIn)
            .with_timeout(Duration::from_secs(30));

        // Login flow: render budget + login navigation + settle
        let wanted = settings.render_budget(&request) + request.timeout;
        assert_eq!(settings.session_budget(wanted), Duration::from_secs(25));
        assert_eq!(settings.session_budget(Duration::from_secs(10)), Duration::from_secs(10));
    }
}
