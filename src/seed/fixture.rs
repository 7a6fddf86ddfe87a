use std::{io::ErrorKind, path::Path};

use serde_json::Value;

use super::SeedError;

/// Read the fixture file; it must hold a non-empty JSON array.
pub async fn load_fixture(path: &Path) -> Result<Vec<Value>, SeedError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            SeedError::FixtureMissing(path.to_path_buf())
        } else {
            SeedError::FixtureRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let parsed: Value = serde_json::from_str(&raw).map_err(|e| SeedError::FixtureParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    match parsed {
        Value::Array(items) if items.is_empty() => Err(SeedError::FixtureEmpty(path.to_path_buf())),
        Value::Array(items) => Ok(items),
        _ => Err(SeedError::FixtureNotArray(path.to_path_buf())),
    }
}
