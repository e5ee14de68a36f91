use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod csv_exporter;
pub mod json_exporter;
pub mod xlsx_exporter;

use crate::config::ExportConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::extraction::ExtractedEntity;
use crate::platform::Platform;
use crate::projection::{project, summarize, CellValue, TabularRow};

pub const DATA_SHEET: &str = "Scraped Data";
pub const SUMMARY_SHEET: &str = "Summary";

/// One scraped page queued for export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub platform: String,
    pub url: String,
    pub data: ExtractedEntity,
    #[serde(default)]
    pub timestamp: String,
}

impl ExportRecord {
    pub fn new(platform: Platform, entity: ExtractedEntity) -> Self {
        Self {
            platform: platform.slug().to_string(),
            url: entity.source_url.clone(),
            timestamp: entity.extracted_at.clone(),
            data: entity,
        }
    }

    /// Display tag for the Platform column; unknown slugs fall back to the entity's platform
    pub fn platform_tag(&self) -> &'static str {
        self.platform
            .parse::<Platform>()
            .unwrap_or_else(|_| self.data.kind.platform())
            .display_tag()
    }
}

/// Export format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            // SpreadsheetML 2003 is opened by Excel under .xls
            ExportFormat::Xlsx => "xls",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "application/vnd.ms-excel",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" | "xls" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ScrapeError::invalid_input(format!("Invalid export format: {}", s))),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Xlsx => write!(f, "xlsx"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

/// A named grid: header row is the union of row columns in first-seen order
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<TabularRow>,
}

impl Sheet {
    pub fn from_rows(name: impl Into<String>, rows: Vec<TabularRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.columns() {
                if !columns.iter().any(|seen| seen == column) {
                    columns.push(column.to_string());
                }
            }
        }

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Cells of `row` aligned to the header; missing cells are `None`
    pub fn aligned<'a>(&'a self, row: &'a TabularRow) -> impl Iterator<Item = Option<&'a CellValue>> + 'a {
        self.columns.iter().map(move |column| row.get(column))
    }
}

/// The two-sheet export document
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub data: Sheet,
    pub summary: Sheet,
}

impl Workbook {
    pub fn sheets(&self) -> [&Sheet; 2] {
        [&self.data, &self.summary]
    }
}

/// Project every record, in order, into the data sheet and compute the summary sheet
pub fn build_workbook(records: &[ExportRecord], exported_at: &str) -> ScrapeResult<Workbook> {
    if records.is_empty() {
        return Err(ScrapeError::invalid_input("No data to export"));
    }

    let rows: Vec<TabularRow> = records
        .iter()
        .flat_map(|record| project(&record.data, record.platform_tag()))
        .collect();
    let summary = summarize(&rows, exported_at);

    debug!("Built workbook: {} records, {} rows", records.len(), rows.len());

    Ok(Workbook {
        data: Sheet::from_rows(DATA_SHEET, rows),
        summary: Sheet::from_rows(SUMMARY_SHEET, summary),
    })
}

fn filename_stamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
        .chars()
        .take(19)
        .collect()
}

/// `scraped-data-YYYY-MM-DDTHH-MM-SS.xls`
pub fn export_filename(now: DateTime<Utc>) -> String {
    export_filename_for(now, ExportFormat::Xlsx)
}

pub fn export_filename_for(now: DateTime<Utc>, format: ExportFormat) -> String {
    format!("scraped-data-{}.{}", filename_stamp(now), format.extension())
}

/// Serialize `records` in `format`. Nothing is returned on failure.
pub fn render(records: &[ExportRecord], format: ExportFormat, exported_at: &str) -> ScrapeResult<Vec<u8>> {
    match format {
        ExportFormat::Xlsx => xlsx_exporter::render_workbook(&build_workbook(records, exported_at)?),
        ExportFormat::Csv => csv_exporter::render_sheet(&build_workbook(records, exported_at)?.data),
        ExportFormat::Json => json_exporter::render_records(records),
    }
}

/// Export statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportStats {
    pub format: ExportFormat,
    pub file_path: PathBuf,
    pub record_count: usize,
    pub file_size_bytes: u64,
    pub export_duration_ms: u64,
}

/// Writes exports into the configured output directory
pub struct ExportManager {
    config: ExportConfig,
}

impl ExportManager {
    pub fn new(config: &ExportConfig) -> ScrapeResult<Self> {
        std::fs::create_dir_all(&config.output_directory).map_err(|e| {
            ScrapeError::export(format!(
                "Cannot create output directory {}: {}",
                config.output_directory.display(),
                e
            ))
        })?;

        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn default_format(&self) -> ExportFormat {
        self.config.default_format.parse().unwrap_or(ExportFormat::Xlsx)
    }

    /// Export under a generated filename in the output directory
    pub async fn export(&self, records: &[ExportRecord], format: ExportFormat) -> ScrapeResult<ExportStats> {
        let now = Utc::now();
        let path = self.config.output_directory.join(export_filename_for(now, format));
        self.export_to(records, &path, format, now).await
    }

    /// Export to an explicit path
    pub async fn export_to(
        &self,
        records: &[ExportRecord],
        path: &Path,
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> ScrapeResult<ExportStats> {
        info!("Exporting {} records to {} as {}", records.len(), path.display(), format);
        let start_time = std::time::Instant::now();

        let bytes = render(records, format, &now.to_rfc3339_opts(SecondsFormat::Secs, true))?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| ScrapeError::export(format!("Cannot write {}: {}", path.display(), e)))?;

        let stats = ExportStats {
            format,
            file_path: path.to_path_buf(),
            record_count: records.len(),
            file_size_bytes: bytes.len() as u64,
            export_duration_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Export completed: {} records in {}ms, file size: {} bytes",
            stats.record_count, stats.export_duration_ms, stats.file_size_bytes
        );

        Ok(stats)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extraction::SubList;
    use crate::platform::EntityKind;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    pub(crate) fn business_record() -> ExportRecord {
        let mut entity = ExtractedEntity::new(EntityKind::BusinessListing);
        entity.source_url = "https://www.google.com/maps/place/Cafe".to_string();
        entity.extracted_at = "2026-03-01T12:00:00+00:00".to_string();
        entity.fields.insert("name".into(), "Cafe <Blue> & Co".into());
        entity.fields.insert("rating".into(), "4.5".into());
        entity.lists.insert(
            "hours".into(),
            SubList::Records(vec![
                [("day".to_string(), "Monday".to_string()), ("hours".to_string(), "9-5".to_string())]
                    .into_iter()
                    .collect(),
            ]),
        );
        ExportRecord::new(Platform::GoogleBusiness, entity)
    }

    pub(crate) fn page_record() -> ExportRecord {
        let mut entity = ExtractedEntity::new(EntityKind::SocialPage);
        entity.source_url = "https://www.facebook.com/acme".to_string();
        entity.fields.insert("name".into(), "Acme".into());
        entity.fields.insert("likes".into(), "1,024 likes".into());
        ExportRecord::new(Platform::Facebook, entity)
    }

    #[test]
    fn test_empty_records_rejected() {
        let err = build_workbook(&[], "now").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput { .. }));
        assert_eq!(err.to_string(), "Invalid input: No data to export");
    }

    #[test]
    fn test_workbook_concatenates_in_order() {
        let workbook = build_workbook(&[business_record(), page_record()], "2026-03-01T12:00:00Z")
            .expect("workbook");

        assert_eq!(workbook.data.name, "Scraped Data");
        assert_eq!(workbook.summary.name, "Summary");

        let types: Vec<_> = workbook.data.rows.iter().map(|row| row.text("Type")).collect();
        assert_eq!(types, vec!["Business", "Hours", "Page"]);

        // Business columns come first, page-only columns are appended on first sight
        assert_eq!(&workbook.data.columns[..4], &["Platform", "Type", "Name", "Category"]);
        assert!(workbook.data.columns.contains(&"Likes".to_string()));
        let likes_at = workbook.data.columns.iter().position(|c| c == "Likes");
        let hours_at = workbook.data.columns.iter().position(|c| c == "Hours #");
        assert!(likes_at > hours_at);

        assert_eq!(workbook.summary.columns, vec!["Metric", "Value"]);
        assert_eq!(workbook.summary.rows[0].get("Value"), Some(&CellValue::Number(3)));
    }

    #[test]
    fn test_aligned_cells_fill_missing() {
        let workbook = build_workbook(&[business_record(), page_record()], "now").expect("workbook");
        let page_row = &workbook.data.rows[2];
        let cells: Vec<_> = workbook.data.aligned(page_row).collect();
        assert_eq!(cells.len(), workbook.data.columns.len());
        let day_at = workbook.data.columns.iter().position(|c| c == "Day").expect("day column");
        assert_eq!(cells[day_at], None);
    }

    #[test]
    fn test_unknown_platform_tag_falls_back_to_entity() {
        let mut record = page_record();
        record.platform = "myspace".to_string();
        assert_eq!(record.platform_tag(), "Facebook");
    }

    #[test]
    fn test_export_filename() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(export_filename(now), "scraped-data-2026-03-01T09-05-07.xls");
        assert_eq!(
            export_filename_for(now, ExportFormat::Csv),
            "scraped-data-2026-03-01T09-05-07.csv"
        );
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("parquet".parse::<ExportFormat>().is_err());
    }

    #[tokio::test]
    async fn test_manager_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ExportConfig {
            default_format: "csv".to_string(),
            output_directory: dir.path().join("exports"),
        };
        let manager = ExportManager::new(&config).expect("manager");
        assert_eq!(manager.default_format(), ExportFormat::Csv);

        let stats = manager
            .export(&[business_record()], ExportFormat::Xlsx)
            .await
            .expect("export");
        assert_eq!(stats.record_count, 1);
        assert!(stats.file_path.extension().is_some_and(|ext| ext == "xls"));

        let written = std::fs::read_to_string(&stats.file_path).expect("read back");
        assert_eq!(written.len() as u64, stats.file_size_bytes);
        assert!(written.contains("<Worksheet ss:Name=\"Scraped Data\">"));
    }
}
