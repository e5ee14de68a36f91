//! Content acquisition: an ordered list of strategies tried one after another
//! until one returns a viable page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
pub mod browser;
pub mod http_client;
pub mod user_agent;

use crate::config::AcquisitionConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::platform::Platform;

pub use http_client::{AlternateIdentityStrategy, DelayedFetchStrategy, HeaderedFetchStrategy};
pub use user_agent::UserAgentRotator;

/// Default viability floor, in characters
pub const MIN_VIABLE_CONTENT_CHARS: usize = 1000;

/// Default pause between a failed attempt and the next strategy
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(2000);

/// Login credentials for the authenticated browser strategy
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Which strategy produced a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    AuthenticatedBrowser,
    BrowserRender,
    HeaderedFetch,
    AlternateIdentityFetch,
    DelayedFetch,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StrategyKind::AuthenticatedBrowser => "authenticated-browser",
            StrategyKind::BrowserRender => "browser-render",
            StrategyKind::HeaderedFetch => "headered-fetch",
            StrategyKind::AlternateIdentityFetch => "alternate-identity-fetch",
            StrategyKind::DelayedFetch => "delayed-fetch",
        };
        f.write_str(name)
    }
}

/// One content acquisition attempt's input
#[derive(Debug, Clone)]
pub struct AcquisitionRequest {
    pub target_url: String,
    pub platform: Platform,
    pub timeout: Duration,
    pub wait_selector: Option<String>,
    pub credentials: Option<Credentials>,
}

impl AcquisitionRequest {
    pub fn new(target_url: impl Into<String>, platform: Platform) -> Self {
        Self {
            target_url: target_url.into(),
            platform,
            timeout: Duration::from_secs(30),
            wait_selector: None,
            credentials: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_wait_selector(mut self, selector: impl Into<String>) -> Self {
        self.wait_selector = Some(selector.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Parse the target URL; a malformed URL fails every strategy the same way
    pub fn parsed_url(&self) -> ScrapeResult<url::Url> {
        url::Url::parse(&self.target_url).map_err(|e| {
            ScrapeError::invalid_input(format!("Malformed URL {}: {}", self.target_url, e))
        })
    }
}

/// Raw page content plus the strategy that produced it
#[derive(Debug, Clone)]
pub struct AcquisitionResult {
    pub raw_content: String,
    pub strategy_used: StrategyKind,
}

/// A self-contained method of obtaining raw page content
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn fetch(&self, request: &AcquisitionRequest) -> ScrapeResult<String>;
}

/// Runs strategies strictly in order and returns the first viable page
pub struct StrategyOrchestrator {
    strategies: Vec<Box<dyn AcquisitionStrategy>>,
    min_content_chars: usize,
    cooldown: Duration,
    attempt_timeout: Duration,
}

impl StrategyOrchestrator {
    pub fn new(strategies: Vec<Box<dyn AcquisitionStrategy>>) -> Self {
        Self {
            strategies,
            min_content_chars: MIN_VIABLE_CONTENT_CHARS,
            cooldown: DEFAULT_COOLDOWN,
            attempt_timeout: Duration::from_secs(90),
        }
    }

    /// Build the standard strategy chain for one request.
    ///
    /// Order: authenticated browser (only with credentials), browser render,
    /// headered fetch, alternate identity fetch, delayed fetch. Browser
    /// strategies are skipped when disabled or not compiled in.
    pub fn from_config(config: &AcquisitionConfig, request: &AcquisitionRequest) -> Self {
        let mut strategies: Vec<Box<dyn AcquisitionStrategy>> = Vec::new();

        #[cfg(feature = "browser")]
        {
            if config.enable_browser {
                let settings = browser::BrowserSettings::from_config(config);
                if request.credentials.is_some() {
                    strategies.push(Box::new(browser::AuthenticatedBrowserStrategy::new(
                        settings.clone(),
                        config.login.clone(),
                    )));
                }
                strategies.push(Box::new(browser::BrowserRenderStrategy::new(settings)));
            } else {
                debug!("Browser strategies disabled by configuration");
            }
        }

        #[cfg(not(feature = "browser"))]
        {
            if config.enable_browser {
                debug!("Browser strategies unavailable: built without the `browser` feature");
            }
            let _ = request;
        }

        let rotator = Arc::new(UserAgentRotator::new(&config.user_agents));
        strategies.push(Box::new(HeaderedFetchStrategy::new(rotator.clone())));
        strategies.push(Box::new(AlternateIdentityStrategy::new(rotator.clone())));
        strategies.push(Box::new(DelayedFetchStrategy::new(
            rotator,
            config.delay_min_ms,
            config.delay_max_ms,
        )));

        Self::new(strategies)
            .with_min_content_chars(config.min_content_chars)
            .with_cooldown(config.cooldown())
            .with_attempt_timeout(config.attempt_timeout())
    }

    pub fn with_min_content_chars(mut self, min_content_chars: usize) -> Self {
        self.min_content_chars = min_content_chars;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Strategy order, for logging and diagnostics
    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Try each strategy in order until one yields viable content.
    ///
    /// Fails with `AcquisitionFailed` carrying the most recent error once
    /// every strategy is exhausted.
    pub async fn acquire(&self, request: &AcquisitionRequest) -> ScrapeResult<AcquisitionResult> {
        let total = self.strategies.len();
        if total == 0 {
            return Err(ScrapeError::AcquisitionFailed {
                url: request.target_url.clone(),
                attempts: 0,
                last_error: "no acquisition strategy configured".to_string(),
            });
        }

        let mut last_error: Option<ScrapeError> = None;

        for (index, strategy) in self.strategies.iter().enumerate() {
            let kind = strategy.kind();
            let started = Instant::now();
            debug!("Strategy {}/{} ({}) for {}", index + 1, total, kind, request.target_url);

            let outcome = match tokio::time::timeout(self.attempt_timeout, strategy.fetch(request)).await {
                Ok(result) => result.and_then(|content| self.validate(content)),
                Err(_) => Err(ScrapeError::Timeout {
                    operation: format!("{} strategy", kind),
                    after_ms: self.attempt_timeout.as_millis() as u64,
                }),
            };

            match outcome {
                Ok(content) => {
                    info!(
                        "Acquired {} chars from {} via {} in {}ms",
                        content.chars().count(),
                        request.target_url,
                        kind,
                        started.elapsed().as_millis()
                    );
                    return Ok(AcquisitionResult {
                        raw_content: content,
                        strategy_used: kind,
                    });
                }
                Err(e) if !e.is_recoverable() => {
                    warn!("Strategy {} rejected {}: {}", kind, request.target_url, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Strategy {} failed for {}: {}", kind, request.target_url, e);
                    last_error = Some(e);

                    if index + 1 < total && !self.cooldown.is_zero() {
                        tokio::time::sleep(self.cooldown).await;
                    }
                }
            }
        }

        Err(ScrapeError::AcquisitionFailed {
            url: request.target_url.clone(),
            attempts: total,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    fn validate(&self, content: String) -> ScrapeResult<String> {
        let length = content.chars().count();
        if length > self.min_content_chars {
            Ok(content)
        } else {
            Err(ScrapeError::ContentTooShort {
                length,
                minimum: self.min_content_chars,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted strategy that records its position in the call order
    struct ScriptedStrategy {
        kind: StrategyKind,
        outcome: Result<usize, &'static str>,
        calls: Arc<Mutex<Vec<StrategyKind>>>,
    }

    #[async_trait]
    impl AcquisitionStrategy for ScriptedStrategy {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        async fn fetch(&self, _request: &AcquisitionRequest) -> ScrapeResult<String> {
            self.calls.lock().unwrap().push(self.kind);
            match self.outcome {
                Ok(len) => Ok("x".repeat(len)),
                Err(message) => Err(ScrapeError::network(message)),
            }
        }
    }

    fn scripted(
        plan: &[(StrategyKind, Result<usize, &'static str>)],
    ) -> (StrategyOrchestrator, Arc<Mutex<Vec<StrategyKind>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let strategies = plan
            .iter()
            .map(|(kind, outcome)| {
                Box::new(ScriptedStrategy {
                    kind: *kind,
                    outcome: *outcome,
                    calls: calls.clone(),
                }) as Box<dyn AcquisitionStrategy>
            })
            .collect();
        (StrategyOrchestrator::new(strategies).with_cooldown(Duration::ZERO), calls)
    }

    fn request() -> AcquisitionRequest {
        AcquisitionRequest::new("https://www.linkedin.com/in/jdoe", Platform::LinkedIn)
    }

    #[tokio::test]
    async fn test_rejects_short_content_and_falls_through() {
        let (orchestrator, calls) = scripted(&[
            (StrategyKind::BrowserRender, Err("browser crashed")),
            (StrategyKind::HeaderedFetch, Err("connection reset")),
            (StrategyKind::AlternateIdentityFetch, Ok(600)),
            (StrategyKind::DelayedFetch, Ok(5000)),
        ]);

        let result = orchestrator.acquire(&request()).await.expect("acquired");

        assert_eq!(result.strategy_used, StrategyKind::DelayedFetch);
        assert_eq!(result.raw_content.len(), 5000);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                StrategyKind::BrowserRender,
                StrategyKind::HeaderedFetch,
                StrategyKind::AlternateIdentityFetch,
                StrategyKind::DelayedFetch,
            ]
        );
    }

    #[tokio::test]
    async fn test_stops_at_first_viable_strategy() {
        let (orchestrator, calls) = scripted(&[
            (StrategyKind::HeaderedFetch, Ok(1500)),
            (StrategyKind::DelayedFetch, Ok(5000)),
        ]);

        let result = orchestrator.acquire(&request()).await.expect("acquired");
        assert_eq!(result.strategy_used, StrategyKind::HeaderedFetch);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_error() {
        let (orchestrator, _) = scripted(&[
            (StrategyKind::HeaderedFetch, Err("first failure")),
            (StrategyKind::DelayedFetch, Ok(1000)),
        ]);

        let err = orchestrator.acquire(&request()).await.unwrap_err();
        match err {
            ScrapeError::AcquisitionFailed { attempts, last_error, .. } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("1000 chars"), "got {}", last_error);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_strategy_list_fails() {
        let orchestrator = StrategyOrchestrator::new(Vec::new());
        let err = orchestrator.acquire(&request()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::AcquisitionFailed { attempts: 0, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_only_between_attempts() {
        let (orchestrator, _) = scripted(&[
            (StrategyKind::HeaderedFetch, Err("blocked")),
            (StrategyKind::DelayedFetch, Ok(2000)),
        ]);
        let orchestrator = orchestrator.with_cooldown(Duration::from_millis(2000));

        let started = tokio::time::Instant::now();
        orchestrator.acquire(&request()).await.expect("acquired");
        assert!(started.elapsed() >= Duration::from_millis(2000));

        let (single, _) = scripted(&[(StrategyKind::HeaderedFetch, Err("blocked"))]);
        let single = single.with_cooldown(Duration::from_millis(2000));
        let started = tokio::time::Instant::now();
        assert!(single.acquire(&request()).await.is_err());
        assert!(started.elapsed() < Duration::from_millis(2000));
    }

    /// Strategy that refuses the request itself
    struct RejectingStrategy {
        calls: Arc<Mutex<Vec<StrategyKind>>>,
    }

    #[async_trait]
    impl AcquisitionStrategy for RejectingStrategy {
        fn kind(&self) -> StrategyKind {
            StrategyKind::HeaderedFetch
        }

        async fn fetch(&self, request: &AcquisitionRequest) -> ScrapeResult<String> {
            self.calls.lock().unwrap().push(self.kind());
            request.parsed_url()?;
            Ok("x".repeat(5000))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_errors_abort_without_retry() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let strategies: Vec<Box<dyn AcquisitionStrategy>> = vec![
            Box::new(RejectingStrategy { calls: calls.clone() }),
            Box::new(ScriptedStrategy {
                kind: StrategyKind::DelayedFetch,
                outcome: Ok(5000),
                calls: calls.clone(),
            }),
        ];
        let orchestrator = StrategyOrchestrator::new(strategies).with_cooldown(Duration::from_millis(2000));
        let request = AcquisitionRequest::new("www.linkedin.com/in/jdoe", Platform::LinkedIn);

        let started = tokio::time::Instant::now();
        let err = orchestrator.acquire(&request).await.unwrap_err();

        assert!(matches!(err, ScrapeError::InvalidInput { .. }), "got {:?}", err);
        assert_eq!(err.http_status(), 400);
        assert_eq!(*calls.lock().unwrap(), vec![StrategyKind::HeaderedFetch]);
        assert!(started.elapsed() < Duration::from_millis(2000));
    }

    /// Strategy that never finishes on its own
    struct HangingStrategy {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl AcquisitionStrategy for HangingStrategy {
        fn kind(&self) -> StrategyKind {
            StrategyKind::BrowserRender
        }

        async fn fetch(&self, _request: &AcquisitionRequest) -> ScrapeResult<String> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            futures::future::pending::<()>().await;
            Ok(String::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_moves_to_next_strategy() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let strategies: Vec<Box<dyn AcquisitionStrategy>> = vec![
            Box::new(HangingStrategy { polls: AtomicUsize::new(0) }),
            Box::new(ScriptedStrategy {
                kind: StrategyKind::HeaderedFetch,
                outcome: Ok(4000),
                calls: calls.clone(),
            }),
        ];
        let orchestrator = StrategyOrchestrator::new(strategies)
            .with_cooldown(Duration::ZERO)
            .with_attempt_timeout(Duration::from_secs(5));

        let result = orchestrator.acquire(&request()).await.expect("acquired");
        assert_eq!(result.strategy_used, StrategyKind::HeaderedFetch);
    }

    #[test]
    fn test_default_chain_without_browser() {
        let mut config = AcquisitionConfig::default();
        config.enable_browser = false;
        let request = request().with_credentials(Some(Credentials::new("u", "p")));

        let orchestrator = StrategyOrchestrator::from_config(&config, &request);
        assert_eq!(
            orchestrator.strategy_kinds(),
            vec![
                StrategyKind::HeaderedFetch,
                StrategyKind::AlternateIdentityFetch,
                StrategyKind::DelayedFetch,
            ]
        );
    }

    #[cfg(feature = "browser")]
    #[test]
    fn test_default_chain_with_browser_and_credentials() {
        let config = AcquisitionConfig::default();
        let request = request().with_credentials(Some(Credentials::new("u", "p")));

        let kinds = StrategyOrchestrator::from_config(&config, &request).strategy_kinds();
        assert_eq!(kinds[0], StrategyKind::AuthenticatedBrowser);
        assert_eq!(kinds[1], StrategyKind::BrowserRender);
        assert_eq!(kinds.len(), 5);
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials::new("jdoe@example.com", "hunter2");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("jdoe@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
