//! JSON file helpers with atomic writes
//!
//! Writes go to a sibling temp file which is synced and renamed over the
//! target, so a data file is either the old version or the new one.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{TandemError, TandemResult};

/// Read JSON from `path`, or `T::default()` if the file doesn't exist
pub fn read_json<T, P>(path: P) -> TandemResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| TandemError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| TandemError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to `path` atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> TandemResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            TandemError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Same directory, so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| TandemError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| TandemError::Storage(format!("Failed to serialize data: {}", e)))?;
    writer
        .flush()
        .map_err(|e| TandemError::Storage(format!("Failed to flush data: {}", e)))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| TandemError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        TandemError::Storage(format!("Failed to rename temp file: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Fixture {
        name: String,
        cents: i64,
    }

    #[test]
    fn test_missing_file_reads_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: Fixture = read_json(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(data, Fixture::default());
    }

    #[test]
    fn test_write_then_read_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("budgets.json");
        let data = Fixture {
            name: "Rent".into(),
            cents: 100_000,
        };

        write_json_atomic(&path, &data).unwrap();

        assert!(!temp_dir.path().join("nested").join("budgets.json.tmp").exists());
        let loaded: Fixture = read_json(&path).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();

        let err = read_json::<Fixture, _>(&path).unwrap_err();
        assert!(matches!(err, TandemError::Storage(_)));
    }
}
