use tracing::debug;

use super::ExportRecord;
use crate::error::{ScrapeError, ScrapeResult};

/// Pretty-printed JSON array of the records as scraped
pub fn render_records(records: &[ExportRecord]) -> ScrapeResult<Vec<u8>> {
    debug!("Rendering {} records as JSON", records.len());

    if records.is_empty() {
        return Err(ScrapeError::invalid_input("No data to export"));
    }

    serde_json::to_vec_pretty(records).map_err(|e| ScrapeError::export(format!("JSON write failed: {}", e)))
}

/// One record per line
pub fn render_records_lines(records: &[ExportRecord]) -> ScrapeResult<Vec<u8>> {
    let mut output = Vec::new();
    for record in records {
        serde_json::to_writer(&mut output, record)
            .map_err(|e| ScrapeError::export(format!("JSON write failed: {}", e)))?;
        output.push(b'\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::{business_record, page_record};

    #[test]
    fn test_records_serialize_camel_case() {
        let bytes = render_records(&[business_record()]).expect("json");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("parse");
        assert_eq!(value[0]["platform"], "google-business");
        assert_eq!(value[0]["data"]["sourceUrl"], "https://www.google.com/maps/place/Cafe");
        assert_eq!(value[0]["data"]["kind"], "business-listing");
    }

    #[test]
    fn test_lines_format() {
        let bytes = render_records_lines(&[business_record(), page_record()]).expect("jsonl");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(text.lines().count(), 2);
        for line in text.lines() {
            let record: ExportRecord = serde_json::from_str(line).expect("line parses");
            assert!(!record.url.is_empty());
        }
    }
}
