use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::{debug, info};

use super::table::Record;
use crate::{FredError, Result};

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub records: usize,
}

impl ExportSummary {
    /// Confirmation shown to the caller in place of the exported rows
    #[inline]
    pub fn message(&self, subject: &str) -> String {
        format!(
            "✅ Saved {} records for `{}` to `{}`",
            self.records,
            subject,
            self.path.display()
        )
    }

    #[inline]
    pub fn to_json(&self) -> Value {
        json!({
            "status": "saved",
            "path": self.path.display().to_string(),
            "records": self.records,
        })
    }
}

/// Write every record as an indented JSON array to `path`, creating missing
/// parent directories.
#[inline]
pub fn persist(records: &[Record], path: &Path) -> Result<ExportSummary> {
    if path.as_os_str().is_empty() {
        return Err(FredError::Validation(
            "file_path must not be empty".to_string(),
        ));
    }

    let path = std::path::absolute(path).map_err(|e| write_error(path, &e))?;

    if let Some(parent) = path.parent() {
        debug!("Ensuring export directory {}", parent.display());
        fs::create_dir_all(parent).map_err(|e| write_error(parent, &e))?;
    }

    let body = serde_json::to_string_pretty(records)?;
    fs::write(&path, body).map_err(|e| write_error(&path, &e))?;

    info!("Exported {} records to {}", records.len(), path.display());
    Ok(ExportSummary {
        path,
        records: records.len(),
    })
}

fn write_error(path: &Path, error: &io::Error) -> FredError {
    FredError::Io(io::Error::new(
        error.kind(),
        format!("Failed to write {}: {}", path.display(), error),
    ))
}
