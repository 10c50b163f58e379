//! Exporting history entries and rasters to PNG files.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat};
use doodler_core::HistoryItem;

use crate::error::{RenderError, RenderResult};
use crate::image::data_url_bytes;
use crate::Raster;

/// Number of prompt characters carried into a download file name.
const PROMPT_CHARS: usize = 20;

/// File name for downloading a history entry.
///
/// `doodle-{ai|user}-{timestamp}{-prompt}.png`, where the timestamp is the
/// UTC ISO-8601 form with `:` and `.` replaced by `-`, and the optional
/// prompt part is its first twenty characters with anything other than
/// ASCII letters and digits replaced by `-`.
#[must_use]
pub fn download_filename(item: &HistoryItem) -> String {
    let timestamp = i64::try_from(item.timestamp)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");

    let prompt = item
        .prompt
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| {
            let cleaned: String = p
                .chars()
                .take(PROMPT_CHARS)
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                .collect();
            format!("-{cleaned}")
        })
        .unwrap_or_default();

    format!("doodle-{}-{timestamp}{prompt}.png", item.kind.file_tag())
}

/// Write a history entry's image into `dir` under its download file name.
///
/// Returns the path written.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the entry's data URL is malformed and
/// [`RenderError::Resource`] if the file cannot be written.
pub fn export_history_item(item: &HistoryItem, dir: impl AsRef<Path>) -> RenderResult<PathBuf> {
    let bytes = data_url_bytes(&item.image_data)?;
    let path = dir.as_ref().join(download_filename(item));
    std::fs::write(&path, bytes)
        .map_err(|e| RenderError::Resource(format!("Failed to write {}: {e}", path.display())))?;
    tracing::info!("Exported history item {} to {}", item.id, path.display());
    Ok(path)
}

/// Encode a raster and write it to `path` as PNG.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn write_png(raster: &Raster, path: impl AsRef<Path>) -> RenderResult<()> {
    let path = path.as_ref();
    let png = raster.encode_png()?;
    std::fs::write(path, png)
        .map_err(|e| RenderError::Resource(format!("Failed to write {}: {e}", path.display())))
}
