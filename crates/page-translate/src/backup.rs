//! Timestamped backups of artifacts and fetched pages.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::error::{Error, Result};

const STAMP: &str = "%Y%m%d_%H%M%S";

fn stamp() -> String {
    Utc::now().format(STAMP).to_string()
}

/// Backup name for `path`: `{stem}_backup_{stamp}{.ext}` in the same directory.
pub fn backup_name(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_backup_{stamp}{ext}"))
}

/// Copy `path` next to itself under a timestamped name.
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let target = backup_name(path, &stamp());
    fs::copy(path, &target).map_err(|e| Error::io(path, e))?;
    Ok(target)
}

/// Save a page tree as `hubspot_page_backup_{document}_{stamp}.json` in `dir`.
pub fn write_page_backup(dir: &Path, document: &str, page: &Value) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let target = dir.join(format!("hubspot_page_backup_{document}_{}.json", stamp()));
    let mut text = serde_json::to_string_pretty(page).map_err(|e| Error::json(&target, e))?;
    text.push('\n');
    fs::write(&target, text).map_err(|e| Error::io(&target, e))?;
    Ok(target)
}
