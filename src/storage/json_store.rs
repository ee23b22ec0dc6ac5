// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::calibration::CalibrationProfile;
use crate::storage::{CalibrationStore, StorageError};
use log::{debug, trace};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const FOLDER_NAME: &str = ".forcescale";
const FILE_NAME: &str = "calibration.json";

/// Pretty-printed JSON profile on the local file system.
#[derive(Debug, Clone)]
pub struct JsonCalibrationStore {
    path: PathBuf,
}

impl JsonCalibrationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.forcescale/calibration.json`
    pub fn in_home_directory() -> Result<Self, StorageError> {
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or(StorageError::NoHomeDirectory)?;
        Ok(Self::new(
            PathBuf::from(home).join(FOLDER_NAME).join(FILE_NAME),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalibrationStore for JsonCalibrationStore {
    fn load(&self) -> Result<Option<CalibrationProfile>, StorageError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!("No calibration stored at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(StorageError::RetrieveError(e.to_string())),
        };

        let profile: CalibrationProfile = serde_json::from_slice(&data)
            .map_err(|e| StorageError::DecodeError(e.to_string()))?;
        debug!(
            "Loaded calibration for {} with {} points from {}",
            profile.device_identifier,
            profile.len(),
            self.path.display()
        );
        Ok(Some(profile))
    }

    fn save(&self, profile: &CalibrationProfile) -> Result<(), StorageError> {
        if let Some(folder) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(folder).map_err(|e| StorageError::SaveError(e.to_string()))?;
        }

        let data = serde_json::to_vec_pretty(profile)
            .map_err(|e| StorageError::SaveError(e.to_string()))?;
        fs::write(&self.path, data).map_err(|e| StorageError::SaveError(e.to_string()))?;
        debug!(
            "Saved calibration with {} points to {}",
            profile.len(),
            self.path.display()
        );
        Ok(())
    }

    fn delete(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Deleted calibration at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::EraseError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationPoint;

    fn store_in(dir: &tempfile::TempDir) -> JsonCalibrationStore {
        JsonCalibrationStore::new(dir.path().join(FOLDER_NAME).join(FILE_NAME))
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load(), Ok(None));
    }

    #[test]
    fn save_creates_folder_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let profile = CalibrationProfile::with_points(
            "Default",
            vec![CalibrationPoint::new(0.0, 0.02), CalibrationPoint::new(100.0, 0.61)],
        );

        store.save(&profile).unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load(), Ok(Some(profile)));
    }

    #[test]
    fn reads_existing_calibration_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"{
  "deviceIdentifier" : "Default",
  "points" : [
    { "grams" : 0, "pressure" : 0 },
    { "grams" : 100, "pressure" : 1 }
  ]
}"#,
        )
        .unwrap();

        let profile = store.load().unwrap().unwrap();
        assert_eq!(profile.device_identifier, "Default");
        assert_eq!(
            profile.points(),
            &[CalibrationPoint::new(0.0, 0.0), CalibrationPoint::new(100.0, 1.0)]
        );
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StorageError::DecodeError(_))));
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&CalibrationProfile::default()).unwrap();

        store.delete().unwrap();
        assert_eq!(store.load(), Ok(None));
        store.delete().unwrap();
    }
}
