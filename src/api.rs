use actix_web::error::InternalError;
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ScrapeError;
use crate::export::{build_workbook, export_filename, xlsx_exporter, ExportFormat, ExportRecord};
use crate::extraction::ExtractedEntity;
use crate::pipeline::PipelineCoordinator;
use crate::platform::Platform;
use crate::session::{ConnectService, StatusQuery};

/// Shared state behind every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: PipelineCoordinator,
    pub connect: ConnectService,
}

/// Body of `POST /api/scrape/{platform}`
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: ExtractedEntity,
    pub platform: Platform,
    pub url: String,
}

/// Body of `POST /api/export/excel`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub export_data: Vec<ExportRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectStartRequest {
    #[serde(default)]
    pub platform: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Body limit used when no configured limit is supplied
pub const DEFAULT_JSON_LIMIT: usize = 10 * 1024 * 1024;

/// Configure API routes with the default body limit
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    configure_api(cfg, DEFAULT_JSON_LIMIT);
}

/// Configure API routes; malformed bodies and queries answer with `{error, details}`
pub fn configure_api(cfg: &mut web::ServiceConfig, json_limit: usize) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config(json_limit))
            .app_data(query_config())
            .route("/scrape/{platform}", web::post().to(scrape))
            .route("/export/excel", web::post().to(export_excel))
            .route("/connect/start", web::post().to(connect_start))
            .route("/connect/callback", web::get().to(connect_callback))
            .route("/connect/status", web::get().to(connect_status))
            .route("/health", web::get().to(health_check)),
    );
}

fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default().limit(limit).error_handler(|err, _req| {
        let response = error_response(&ScrapeError::invalid_input(format!("Invalid request body: {}", err)));
        InternalError::from_response(err, response).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = error_response(&ScrapeError::invalid_input(format!("Invalid query: {}", err)));
        InternalError::from_response(err, response).into()
    })
}

/// Map a failure to `{error, details}` with its transport status
pub fn error_response(e: &ScrapeError) -> HttpResponse {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match e {
        ScrapeError::InvalidInput { message } => ErrorResponse {
            error: message.clone(),
            details: None,
        },
        ScrapeError::AcquisitionFailed { last_error, .. } => ErrorResponse {
            error: "Failed to acquire page content".to_string(),
            details: Some(last_error.clone()),
        },
        ScrapeError::ExportFailed { message } => ErrorResponse {
            error: "Failed to generate Excel file".to_string(),
            details: Some(message.clone()),
        },
        other => ErrorResponse {
            error: other.to_string(),
            details: None,
        },
    };
    HttpResponse::build(status).json(body)
}

/// Scrape one URL for a platform
async fn scrape(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<ScrapeRequest>,
) -> ActixResult<HttpResponse> {
    let platform = match path.into_inner().parse::<Platform>() {
        Ok(platform) => platform,
        Err(e) => return Ok(error_response(&e)),
    };
    let url = req.into_inner().url;
    info!("API: Scraping {} URL: {}", platform, url);

    match state.pipeline.run(platform, &url).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ScrapeResponse {
            success: true,
            url: data.source_url.clone(),
            data,
            platform,
        })),
        Err(e) => {
            error!("API: Failed to scrape {}: {}", url, e);
            Ok(error_response(&e))
        }
    }
}

/// Build the workbook and return it as a download
async fn export_excel(req: web::Json<ExportRequest>) -> ActixResult<HttpResponse> {
    let records = req.into_inner().export_data;
    info!("API: Exporting {} records", records.len());

    let now = chrono::Utc::now();
    let bytes = build_workbook(&records, &now.to_rfc3339())
        .and_then(|workbook| xlsx_exporter::render_workbook(&workbook));

    match bytes {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .content_type(ExportFormat::Xlsx.content_type())
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export_filename(now)),
            ))
            .body(bytes)),
        Err(e) => {
            error!("API: Export failed: {}", e);
            Ok(error_response(&e))
        }
    }
}

async fn connect_start(state: web::Data<AppState>, req: web::Json<ConnectStartRequest>) -> ActixResult<HttpResponse> {
    match state.connect.start(&req.platform) {
        Ok(started) => Ok(HttpResponse::Ok().json(started)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn connect_callback(state: web::Data<AppState>, query: web::Query<SessionQuery>) -> ActixResult<HttpResponse> {
    let Some(session_id) = query.session.as_deref() else {
        return Ok(error_response(&ScrapeError::invalid_input("Missing parameters")));
    };

    match state.connect.callback(session_id) {
        Ok(session) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "platform": session.platform,
            "connected": session.connected
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn connect_status(state: web::Data<AppState>, query: web::Query<SessionQuery>) -> ActixResult<HttpResponse> {
    let query = query.into_inner();

    if let Some(session_id) = query.session {
        let connected = state.connect.status(&StatusQuery::Session(session_id));
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "connected": connected })));
    }

    if let Some(platform) = query.platform {
        return match platform.parse::<Platform>() {
            Ok(platform) => {
                let connected = state.connect.status(&StatusQuery::Platform(platform));
                Ok(HttpResponse::Ok().json(serde_json::json!({ "connected": connected })))
            }
            Err(e) => Ok(error_response(&e)),
        };
    }

    // No filter: report every account platform
    let facebook = state.connect.status(&StatusQuery::Platform(Platform::Facebook));
    let linkedin = state.connect.status(&StatusQuery::Platform(Platform::LinkedIn));
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "connected": facebook || linkedin,
        "facebook": facebook,
        "linkedin": linkedin
    })))
}

/// Health check endpoint
async fn health_check() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
