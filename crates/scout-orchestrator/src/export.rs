//! Export of the found list
//!
//! One column, header `website`, one row per URL in first-seen order. The
//! file extension picks the format.

use rust_xlsxwriter::Workbook;
use scout_core::{Result, ScoutError};
use serde::Serialize;
use std::path::Path;

/// Column header used by every format
pub const WEBSITE_COLUMN: &str = "website";

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Json,
}

impl ExportFormat {
    /// Pick a format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("xlsx") => Ok(Self::Xlsx),
            Some("json") => Ok(Self::Json),
            _ => Err(ScoutError::Export(format!(
                "Unsupported output file {:?}: use .xlsx or .json",
                path
            ))),
        }
    }
}

#[derive(Serialize)]
struct WebsiteRow<'a> {
    website: &'a str,
}

/// Write `websites` to `path`, returning the format used
pub fn export_websites(websites: &[String], path: &Path) -> Result<ExportFormat> {
    let format = ExportFormat::from_path(path)?;

    match format {
        ExportFormat::Xlsx => write_xlsx(websites, path)?,
        ExportFormat::Json => write_json(websites, path)?,
    }

    tracing::info!("Wrote {} websites to {:?}", websites.len(), path);
    Ok(format)
}

fn write_xlsx(websites: &[String], path: &Path) -> Result<()> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| ScoutError::Export(e.to_string());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet
        .write_string(0, 0, WEBSITE_COLUMN)
        .map_err(xlsx_err)?;
    for (row, website) in websites.iter().enumerate() {
        worksheet
            .write_string(row as u32 + 1, 0, website.as_str())
            .map_err(xlsx_err)?;
    }

    workbook.save(path).map_err(xlsx_err)
}

fn write_json(websites: &[String], path: &Path) -> Result<()> {
    let rows: Vec<WebsiteRow<'_>> = websites
        .iter()
        .map(|w| WebsiteRow { website: w })
        .collect();
    std::fs::write(path, serde_json::to_string_pretty(&rows)?)?;
    Ok(())
}
