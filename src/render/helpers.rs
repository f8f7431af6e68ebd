use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub fn ensure_dir(path: &Path) -> Result<(), AppError> {
    fs::create_dir_all(path).map_err(|e| {
        AppError::Settings(format!("Unable to create directory {}: {e}", path.display()))
    })
}

pub fn write_string(path: &Path, content: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    fs::write(path, content)
        .map_err(|e| AppError::Settings(format!("Unable to write {}: {e}", path.display())))
}

/// Export target inside `dir`, e.g. `<dir>/Survey_Summary_Report.csv`.
pub fn export_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(file_name)
}
