//! JSON snapshots of a history book
//!
//! Statuses and quiz kinds are closed enums, so a snapshot carrying an
//! unknown value fails to load instead of passing it through.

use std::fs;
use std::path::Path;

use crate::history::HistoryBook;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn from_json(raw: &str) -> Result<HistoryBook, SnapshotError> {
    Ok(serde_json::from_str(raw)?)
}

pub fn to_json(book: &HistoryBook) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(book)?)
}

pub fn load(path: &Path) -> Result<HistoryBook, SnapshotError> {
    let raw = fs::read_to_string(path)?;
    let book = from_json(&raw)?;
    tracing::debug!(path = %path.display(), notebooks = book.notebooks().count(), "snapshot loaded");
    Ok(book)
}

/// Writes through a sibling temp file so a failed write keeps the old file.
pub fn save(path: &Path, book: &HistoryBook) -> Result<(), SnapshotError> {
    let json = to_json(book)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
