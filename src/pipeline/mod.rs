//! Request pipeline: validate, acquire, parse, extract, stamp.

use chrono::{SecondsFormat, Utc};
use scraper::Html;
use std::sync::Arc;
use tracing::debug;

use crate::acquisition::{AcquisitionRequest, StrategyOrchestrator};
use crate::config::AcquisitionConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::extraction::{extract_page, schema_for, ExtractedEntity};
use crate::logging::{LogContext, PerformanceLogger, RequestIdGenerator};
use crate::platform::{EntityKind, Platform};
use crate::{log_info, log_warn};

/// Builds the strategy chain for one request
pub type OrchestratorFactory =
    Arc<dyn Fn(&AcquisitionConfig, &AcquisitionRequest) -> StrategyOrchestrator + Send + Sync>;

/// Runs one scrape request end to end
#[derive(Clone)]
pub struct PipelineCoordinator {
    config: AcquisitionConfig,
    orchestrators: OrchestratorFactory,
}

impl PipelineCoordinator {
    pub fn new(config: AcquisitionConfig) -> Self {
        Self {
            config,
            orchestrators: Arc::new(StrategyOrchestrator::from_config),
        }
    }

    /// Replace the strategy chain builder, e.g. with canned strategies
    pub fn with_orchestrator_factory(mut self, factory: OrchestratorFactory) -> Self {
        self.orchestrators = factory;
        self
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Acquire `url` and extract it with the schema its platform and path select.
    ///
    /// Fails on an empty or foreign URL and when every acquisition strategy is
    /// exhausted. A page whose name cannot be extracted is still returned,
    /// flagged `partial`.
    pub async fn run(&self, platform: Platform, url: &str) -> ScrapeResult<ExtractedEntity> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ScrapeError::invalid_input("URL is required"));
        }
        platform.validate_url(url)?;

        let kind = platform.entity_kind_for(url);
        let request = self.request_for(platform, kind, url);
        request.parsed_url()?;

        let context = LogContext::new("pipeline", "scrape")
            .with_request_id(RequestIdGenerator::generate())
            .with_platform(platform.slug())
            .with_url(url);
        let perf = PerformanceLogger::new(context.clone());

        let orchestrator = (self.orchestrators)(&self.config, &request);
        debug!("Strategy order for {}: {:?}", url, orchestrator.strategy_kinds());

        let acquired = match orchestrator.acquire(&request).await {
            Ok(acquired) => acquired,
            Err(e) => {
                perf.finish_with_error("Scrape failed", &e);
                return Err(e);
            }
        };

        let entity = extract_html(kind, url, &acquired.raw_content);
        let context = context
            .with_strategy(acquired.strategy_used.to_string())
            .with_number_field("content_chars", acquired.raw_content.chars().count() as i64)
            .with_bool_field("partial", entity.partial);
        if entity.partial {
            log_warn!(context, "No name extracted; returning partial entity");
        } else {
            log_info!(context, "Extracted {}", entity.name());
        }

        perf.finish_with_status("Scrape completed", if entity.partial { "partial" } else { "ok" });
        Ok(entity)
    }

    fn request_for(&self, platform: Platform, kind: EntityKind, url: &str) -> AcquisitionRequest {
        let mut request = AcquisitionRequest::new(url, platform).with_timeout(self.config.request_timeout());
        if let Some(selector) = platform.wait_selector() {
            request = request.with_wait_selector(selector);
        }
        // Only the professional profile flow logs in
        if kind == EntityKind::ProfessionalProfile {
            request = request.with_credentials(self.config.credentials.clone());
        }
        request
    }
}

/// Extract an already-fetched page and stamp it as extracted now
pub fn extract_html(kind: EntityKind, url: &str, html: &str) -> ExtractedEntity {
    let document = Html::parse_document(html);
    let mut entity = extract_page(&document, schema_for(kind), url);
    entity.extracted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    entity.partial = entity.name().is_empty();
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{AcquisitionStrategy, Credentials, StrategyKind};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct CannedStrategy {
        body: Result<String, String>,
        seen: Arc<Mutex<Vec<AcquisitionRequest>>>,
    }

    #[async_trait]
    impl AcquisitionStrategy for CannedStrategy {
        fn kind(&self) -> StrategyKind {
            StrategyKind::HeaderedFetch
        }

        async fn fetch(&self, request: &AcquisitionRequest) -> ScrapeResult<String> {
            self.seen.lock().unwrap().push(request.clone());
            self.body.clone().map_err(ScrapeError::network)
        }
    }

    fn padded(html: &str) -> String {
        format!("<html><body>{}<div>{}</div></body></html>", html, "x".repeat(1200))
    }

    fn coordinator(body: Result<String, String>) -> (PipelineCoordinator, Arc<Mutex<Vec<AcquisitionRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let mut config = AcquisitionConfig::default();
        config.credentials = Some(Credentials::new("user@example.com", "hunter2"));

        let factory: OrchestratorFactory = Arc::new(move |_config: &AcquisitionConfig, _request: &AcquisitionRequest| {
            StrategyOrchestrator::new(vec![Box::new(CannedStrategy {
                body: body.clone(),
                seen: recorder.clone(),
            })])
            .with_cooldown(Duration::ZERO)
        });
        (PipelineCoordinator::new(config).with_orchestrator_factory(factory), seen)
    }

    #[tokio::test]
    async fn test_empty_url_is_invalid_input() {
        let (pipeline, seen) = coordinator(Ok(String::new()));
        let err = pipeline.run(Platform::LinkedIn, "  ").await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput { .. }));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_url_is_rejected_before_fetching() {
        let (pipeline, seen) = coordinator(Ok(String::new()));
        let err = pipeline
            .run(Platform::LinkedIn, "https://example.com/in/jdoe")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl { .. }));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_schemeless_url_is_rejected_before_fetching() {
        let (pipeline, seen) = coordinator(Ok(padded("<h1>Jane Doe</h1>")));
        let err = pipeline
            .run(Platform::LinkedIn, "www.linkedin.com/in/jdoe")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput { .. }), "got {:?}", err);
        assert_eq!(err.http_status(), 400);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile_request_carries_credentials_and_wait_selector() {
        let (pipeline, seen) = coordinator(Ok(padded("<h1>Jane Doe</h1>")));
        let entity = pipeline
            .run(Platform::LinkedIn, "https://www.linkedin.com/in/jdoe")
            .await
            .expect("entity");

        assert_eq!(entity.kind, EntityKind::ProfessionalProfile);
        assert_eq!(entity.name(), "Jane Doe");
        assert_eq!(entity.source_url, "https://www.linkedin.com/in/jdoe");
        assert!(!entity.partial);
        assert!(chrono::DateTime::parse_from_rfc3339(&entity.extracted_at).is_ok());

        let requests = seen.lock().unwrap();
        assert!(requests[0].credentials.is_some());
        assert_eq!(requests[0].wait_selector.as_deref(), Some("h1"));
    }

    #[tokio::test]
    async fn test_company_request_has_no_credentials() {
        let (pipeline, seen) = coordinator(Ok(padded("<h1>Acme</h1>")));
        let entity = pipeline
            .run(Platform::LinkedIn, "https://www.linkedin.com/company/acme")
            .await
            .expect("entity");
        assert_eq!(entity.kind, EntityKind::ProfessionalCompany);
        assert!(seen.lock().unwrap()[0].credentials.is_none());
    }

    #[tokio::test]
    async fn test_missing_name_is_partial_not_error() {
        let (pipeline, _) = coordinator(Ok(padded("<p>nothing useful</p>")));
        let entity = pipeline
            .run(Platform::Facebook, "https://www.facebook.com/profile.php?id=4")
            .await
            .expect("entity");
        assert_eq!(entity.kind, EntityKind::SocialProfile);
        assert!(entity.partial);
    }

    #[tokio::test]
    async fn test_google_request_has_no_wait_selector() {
        let (pipeline, seen) = coordinator(Ok(padded("<h1>Cafe</h1>")));
        pipeline
            .run(Platform::GoogleBusiness, "https://www.google.com/maps/place/Cafe")
            .await
            .expect("entity");
        assert!(seen.lock().unwrap()[0].wait_selector.is_none());
    }

    #[tokio::test]
    async fn test_acquisition_failure_propagates() {
        let (pipeline, _) = coordinator(Err("connection reset".to_string()));
        let err = pipeline
            .run(Platform::Facebook, "https://www.facebook.com/acme")
            .await
            .unwrap_err();
        match err {
            ScrapeError::AcquisitionFailed { attempts, last_error, .. } => {
                assert_eq!(attempts, 1);
                assert!(last_error.contains("connection reset"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
