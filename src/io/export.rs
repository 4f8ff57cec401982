//! Export tables to CSV and summaries to plain text.
//!
//! Outputs are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::AppError;

/// Create the output directory (and parents) if needed.
pub fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::new(2, format!("Failed to create output directory '{}': {e}", dir.display()))
    })
}

/// Write serializable rows to a CSV file, header taken from the row type.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    for row in rows {
        writer.serialize(row).map_err(|e| {
            AppError::new(2, format!("Failed to write CSV row to '{}': {e}", path.display()))
        })?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV '{}': {e}", path.display())))?;

    info!(path = %path.display(), rows = rows.len(), "wrote table");
    println!("Saved: {}", path.display());
    Ok(())
}

/// Write a text artifact.
pub fn write_text(path: &Path, contents: &str) -> Result<(), AppError> {
    fs::write(path, contents)
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))?;
    info!(path = %path.display(), "wrote text");
    println!("Saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        #[serde(rename = "T_K")]
        t: f64,
        phases: String,
    }

    #[test]
    fn csv_header_comes_from_serde_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let rows = vec![
            Row { t: 1000.0, phases: "BCC_A2".into() },
            Row { t: 1350.0, phases: "FCC_A1+M23C6".into() },
        ];
        write_csv(&path, &rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["T_K,phases", "1000.0,BCC_A2", "1350.0,FCC_A1+M23C6"]);
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("rows.csv");
        let err = write_csv::<Row>(&path, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn ensure_dir_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        write_text(&nested.join("note.txt"), "hello\n").unwrap();
        assert_eq!(fs::read_to_string(nested.join("note.txt")).unwrap(), "hello\n");
    }
}
