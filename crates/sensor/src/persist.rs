//! Atomic JSON state persistence
//!
//! State is written to a sibling temp file and renamed into place, so a
//! crash mid-write can never leave a corrupt calibration or posterior on
//! disk. A missing file on load is not an error.

use std::fs;
use std::path::Path;

use contracts::TelemetryError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize `state` as pretty JSON and atomically replace `path`
pub fn save_json<T: Serialize>(path: &Path, state: &T) -> Result<(), TelemetryError> {
    let data = serde_json::to_vec_pretty(state)
        .map_err(|e| TelemetryError::state_persist(path.display().to_string(), e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load JSON state; `Ok(None)` when the file does not exist
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, TelemetryError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|e| TelemetryError::state_persist(path.display().to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        value: f64,
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        save_json(&path, &Blob { value: 1.5 }).unwrap();
        let loaded: Option<Blob> = load_json(&path).unwrap();
        assert_eq!(loaded, Some(Blob { value: 1.5 }));

        // No temp file left behind
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Blob> = load_json(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{ not json").unwrap();
        let loaded: Result<Option<Blob>, _> = load_json(&path);
        assert!(loaded.is_err());
    }
}
