use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use profile_harvester::config::AppConfig;
use profile_harvester::export::{ExportFormat, ExportManager, ExportRecord};
use profile_harvester::logging::init_logging;
use profile_harvester::pipeline::{extract_html, PipelineCoordinator};
use profile_harvester::platform::Platform;

#[derive(Parser)]
#[command(name = "ph-cli")]
#[command(about = "Profile Harvester command line interface")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(short, long, help = "Configuration file path")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape one or more pages and export the results
    Scrape {
        #[arg(short, long, help = "linkedin, google-business or facebook")]
        platform: Platform,

        #[arg(required = true, help = "Page URLs")]
        urls: Vec<String>,

        #[arg(short, long, help = "Output file path")]
        output: Option<PathBuf>,

        #[arg(short, long, help = "Output format", value_enum)]
        format: Option<OutputFormat>,
    },

    /// Extract a saved HTML page without fetching anything
    Extract {
        #[arg(short, long)]
        platform: Platform,

        #[arg(short, long, help = "URL the page was saved from")]
        url: String,

        #[arg(help = "Path to the saved HTML file")]
        html_file: PathBuf,
    },

    /// Check whether a URL belongs to a platform
    Validate {
        #[arg(short, long)]
        platform: Platform,

        url: String,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum OutputFormat {
    Xlsx,
    Csv,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Xlsx => ExportFormat::Xlsx,
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path).await?,
        None => AppConfig::load().await?,
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging)?;

    info!("Profile Harvester CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Scrape {
            platform,
            urls,
            output,
            format,
        } => execute_scrape(&config, platform, urls, output, format).await,
        Commands::Extract {
            platform,
            url,
            html_file,
        } => extract_file(platform, url, html_file).await,
        Commands::Validate { platform, url } => validate_url(platform, &url),
    }
}

async fn execute_scrape(
    config: &AppConfig,
    platform: Platform,
    urls: Vec<String>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> Result<()> {
    let pipeline = PipelineCoordinator::new(config.acquisition.clone());
    let mut records = Vec::new();

    // One request at a time
    for url in &urls {
        match pipeline.run(platform, url).await {
            Ok(entity) => {
                if entity.partial {
                    println!("⚠ {} (partial: no name found)", url);
                } else {
                    println!("✓ {} -> {}", url, entity.name());
                }
                records.push(ExportRecord::new(platform, entity));
            }
            Err(e) => {
                error!("Failed to scrape {}: {}", url, e);
                println!("✗ {}: {}", url, e);
            }
        }
    }

    if records.is_empty() {
        anyhow::bail!("No page could be scraped");
    }

    let manager = ExportManager::new(&config.export)?;
    let format = format.map(ExportFormat::from).unwrap_or_else(|| manager.default_format());

    let stats = match output {
        Some(path) => manager.export_to(&records, &path, format, chrono::Utc::now()).await?,
        None => manager.export(&records, format).await?,
    };

    println!(
        "Exported {} of {} pages to {} ({} bytes)",
        stats.record_count,
        urls.len(),
        stats.file_path.display(),
        stats.file_size_bytes
    );
    Ok(())
}

async fn extract_file(platform: Platform, url: String, html_file: PathBuf) -> Result<()> {
    platform.validate_url(&url)?;

    let html = tokio::fs::read_to_string(&html_file)
        .await
        .with_context(|| format!("Cannot read {}", html_file.display()))?;

    let entity = extract_html(platform.entity_kind_for(&url), &url, &html);
    println!("{}", serde_json::to_string_pretty(&entity)?);
    Ok(())
}

fn validate_url(platform: Platform, url: &str) -> Result<()> {
    match platform.validate_url(url) {
        Ok(()) => {
            println!("✓ Valid {} URL ({})", platform.display_tag(), platform.entity_kind_for(url));
            Ok(())
        }
        Err(e) => {
            println!("✗ {}", e);
            Err(e.into())
        }
    }
}
