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
use core::fmt;

pub mod json_store;
pub mod memory_store;

pub use json_store::JsonCalibrationStore;
pub use memory_store::MemoryCalibrationStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    NoHomeDirectory,
    RetrieveError(String),
    DecodeError(String),
    SaveError(String),
    EraseError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NoHomeDirectory => {
                write!(f, "unable to locate the home directory for calibration storage")
            }
            StorageError::RetrieveError(e) => write!(f, "unable to read calibration: {}", e),
            StorageError::DecodeError(e) => write!(f, "calibration data is corrupt: {}", e),
            StorageError::SaveError(e) => write!(f, "unable to save calibration: {}", e),
            StorageError::EraseError(e) => write!(f, "unable to delete calibration: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

/// Durable home of the device's calibration profile.
///
/// Profiles are always read and written whole.
pub trait CalibrationStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<CalibrationProfile>, StorageError>;

    fn save(&self, profile: &CalibrationProfile) -> Result<(), StorageError>;

    /// Removes the stored profile. Deleting a missing profile is not an error.
    fn delete(&self) -> Result<(), StorageError>;
}

impl<T> CalibrationStore for &T
where
    T: CalibrationStore + ?Sized,
{
    fn load(&self) -> Result<Option<CalibrationProfile>, StorageError> {
        (**self).load()
    }

    fn save(&self, profile: &CalibrationProfile) -> Result<(), StorageError> {
        (**self).save(profile)
    }

    fn delete(&self) -> Result<(), StorageError> {
        (**self).delete()
    }
}
