//! On-disk JSON snapshot of the whole network.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{RouteDescription, Segment, Service, Stop};

use super::StoreError;

/// Every table of the store, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stops: Vec<Stop>,
    pub services: Vec<Service>,
    pub segments: Vec<Segment>,
    pub route_descriptions: Vec<RouteDescription>,
}

impl Snapshot {
    /// Read a snapshot from disk.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|e| StoreError::Snapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the snapshot to disk.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string(self).map_err(|e| StoreError::Snapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopCode;
    use tempfile::tempdir;

    fn sample() -> Snapshot {
        Snapshot {
            stops: vec![Stop {
                code: StopCode::parse("17091").unwrap(),
                road_name: "Clementi Ave 3".into(),
                description: "Clementi Int".into(),
                latitude: 1.3149,
                longitude: 103.7651,
            }],
            ..Snapshot::default()
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("network.json");

        sample().save(&path).unwrap();
        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("network.json");

        sample().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Snapshot::load(Path::new("/nonexistent/network.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn corrupt_file_is_snapshot_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("network.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Snapshot::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Snapshot { .. }));
    }
}
