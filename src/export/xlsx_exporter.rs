use std::borrow::Cow;
use std::fmt::Write;
use tracing::debug;

use super::{Sheet, Workbook};
use crate::error::{ScrapeError, ScrapeResult};
use crate::projection::CellValue;

/// Render a workbook as SpreadsheetML 2003 XML, which Excel opens as `.xls`
pub fn render_workbook(workbook: &Workbook) -> ScrapeResult<Vec<u8>> {
    debug!(
        "Rendering SpreadsheetML: {} data rows, {} summary rows",
        workbook.data.rows.len(),
        workbook.summary.rows.len()
    );

    let mut out = String::new();
    write_workbook(&mut out, workbook).map_err(|e| ScrapeError::export(format!("SpreadsheetML write failed: {}", e)))?;
    Ok(out.into_bytes())
}

fn write_workbook(out: &mut String, workbook: &Workbook) -> std::fmt::Result {
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<?mso-application progid=\"Excel.Sheet\"?>\n");
    out.push_str("<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\"\n");
    out.push_str("          xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\n");
    out.push_str("  <Styles>\n");
    out.push_str("    <Style ss:ID=\"header\"><Font ss:Bold=\"1\"/></Style>\n");
    out.push_str("  </Styles>\n");

    for sheet in workbook.sheets() {
        write_sheet(out, sheet)?;
    }

    out.push_str("</Workbook>\n");
    Ok(())
}

fn write_sheet(out: &mut String, sheet: &Sheet) -> std::fmt::Result {
    writeln!(out, "  <Worksheet ss:Name=\"{}\">", html_escape::encode_double_quoted_attribute(&sheet.name))?;
    out.push_str("    <Table>\n");

    // Header row
    out.push_str("      <Row>");
    for column in &sheet.columns {
        write!(
            out,
            "<Cell ss:StyleID=\"header\"><Data ss:Type=\"String\">{}</Data></Cell>",
            html_escape::encode_text(column)
        )?;
    }
    out.push_str("</Row>\n");

    for row in &sheet.rows {
        out.push_str("      <Row>");
        for cell in sheet.aligned(row) {
            write_cell(out, cell)?;
        }
        out.push_str("</Row>\n");
    }

    out.push_str("    </Table>\n");
    out.push_str("  </Worksheet>\n");
    Ok(())
}

fn write_cell(out: &mut String, cell: Option<&CellValue>) -> std::fmt::Result {
    match cell {
        Some(CellValue::Number(n)) => write!(out, "<Cell><Data ss:Type=\"Number\">{}</Data></Cell>", n),
        Some(CellValue::Text(text)) => write!(
            out,
            "<Cell><Data ss:Type=\"String\">{}</Data></Cell>",
            html_escape::encode_text(&xml_safe(text))
        ),
        None => write!(out, "<Cell><Data ss:Type=\"String\"></Data></Cell>"),
    }
}

/// Drop characters XML 1.0 cannot carry; tab, newline and carriage return stay
fn xml_safe(text: &str) -> Cow<'_, str> {
    let allowed = |c: char| c >= ' ' || matches!(c, '\t' | '\n' | '\r');
    if text.chars().all(allowed) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| allowed(c)).collect())
    }
}
