use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use tracing::info;

use profile_harvester::api::{configure_api, AppState};
use profile_harvester::config::AppConfig;
use profile_harvester::logging::{init_logging, LogContext, RequestIdGenerator};
use profile_harvester::pipeline::PipelineCoordinator;
use profile_harvester::session::ConnectService;

#[actix_rt::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().await?;
    init_logging(&config.logging)?;

    let context = LogContext::new("main", "startup")
        .with_request_id(RequestIdGenerator::generate())
        .with_string_field("version", env!("CARGO_PKG_VERSION"));
    profile_harvester::log_info!(context, "Profile Harvester starting up");

    let state = AppState {
        pipeline: PipelineCoordinator::new(config.acquisition.clone()),
        connect: ConnectService::in_memory(),
    };
    let json_limit = config.api.max_request_size_mb * 1024 * 1024;
    let bind = (config.api.host.clone(), config.api.port);

    info!("Listening on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| configure_api(cfg, json_limit))
    })
    .bind(bind)?
    .run()
    .await?;

    info!("Profile Harvester shutting down");
    Ok(())
}
