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

use crate::calibration::FitError;
use crate::storage::StorageError;
use core::fmt;

/// Why a session is uncalibrated. Never fatal: the session keeps reporting
/// pressure and reads zero grams until a usable calibration is loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    NotCalibrated,
    InsufficientData { points: usize },
    DegenerateData,
    Storage(StorageError),
}

impl From<FitError> for CalibrationError {
    fn from(err: FitError) -> Self {
        match err {
            FitError::InsufficientData { points } => CalibrationError::InsufficientData { points },
            FitError::DegenerateData => CalibrationError::DegenerateData,
        }
    }
}

impl From<StorageError> for CalibrationError {
    fn from(err: StorageError) -> Self {
        CalibrationError::Storage(err)
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::NotCalibrated => write!(f, "Not calibrated"),
            CalibrationError::InsufficientData { points } => write!(
                f,
                "Insufficient calibration data: {} point(s), at least 2 required",
                points
            ),
            CalibrationError::DegenerateData => write!(
                f,
                "Degenerate calibration data: all points were captured at the same pressure"
            ),
            CalibrationError::Storage(e) => write!(f, "Error loading calibration: {}", e),
        }
    }
}

impl std::error::Error for CalibrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalibrationError::Storage(e) => Some(e),
            _ => None,
        }
    }
}
