//! Published CSV writer.
//!
//! Writes are atomic: rows go to a hidden temporary file next to the target,
//! which is renamed into place only after a successful flush. A failed write
//! leaves no partial file behind.

use minutebars_core::{OutputRow, OUTPUT_HEADER};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Write `rows` to `path`, creating parent directories as needed.
///
/// The header is always written, even for an empty row set.
pub fn write_rows(path: &Path, rows: &[OutputRow]) -> Result<(), WriteError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| WriteError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = tmp_path(path);
    let result = write_csv(&tmp, rows).and_then(|()| {
        fs::rename(&tmp, path).map_err(|source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_csv(tmp: &Path, rows: &[OutputRow]) -> Result<(), WriteError> {
    let csv_err = |source: csv::Error| WriteError::Csv {
        path: tmp.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(tmp).map_err(csv_err)?;
    writer.write_record(OUTPUT_HEADER).map_err(csv_err)?;
    for row in rows {
        writer.write_record(row.to_record()).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| WriteError::Io {
        path: tmp.to_path_buf(),
        source,
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
