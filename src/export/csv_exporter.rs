use csv::WriterBuilder;
use tracing::debug;

use super::Sheet;
use crate::error::{ScrapeError, ScrapeResult};

/// Render one sheet as CSV with a header row; missing cells are empty
pub fn render_sheet(sheet: &Sheet) -> ScrapeResult<Vec<u8>> {
    render_sheet_with(sheet, b',', csv::QuoteStyle::Necessary)
}

/// Render with a custom delimiter and quoting
pub fn render_sheet_with(sheet: &Sheet, delimiter: u8, quote_style: csv::QuoteStyle) -> ScrapeResult<Vec<u8>> {
    debug!("Rendering CSV sheet '{}': {} rows", sheet.name, sheet.rows.len());

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .quote_style(quote_style)
        .from_writer(Vec::new());

    writer.write_record(&sheet.columns).map_err(csv_error)?;

    for row in &sheet.rows {
        let record: Vec<String> = sheet
            .aligned(row)
            .map(|cell| cell.map(ToString::to_string).unwrap_or_default())
            .collect();
        writer.write_record(&record).map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| ScrapeError::export(format!("CSV flush failed: {}", e)))
}

fn csv_error(e: csv::Error) -> ScrapeError {
    ScrapeError::export(format!("CSV write failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::build_workbook;
    use crate::export::tests::{business_record, page_record};

    #[test]
    fn test_csv_has_header_and_rows() {
        let workbook = build_workbook(&[business_record(), page_record()], "now").expect("workbook");
        let bytes = render_sheet(&workbook.data).expect("csv");

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = reader.headers().expect("headers").iter().map(String::from).collect();
        assert_eq!(headers, workbook.data.columns);

        let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().expect("records");
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][2], "Cafe <Blue> & Co");
        assert_eq!(&rows[2][1], "Page");
    }

    #[test]
    fn test_custom_delimiter() {
        let workbook = build_workbook(&[page_record()], "now").expect("workbook");
        let bytes = render_sheet_with(&workbook.data, b';', csv::QuoteStyle::Always).expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.starts_with("\"Platform\";\"Type\";\"Name\""));
    }
}
