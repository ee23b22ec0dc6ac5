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
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Process-local store, for embedding hosts that persist elsewhere and for tests.
pub struct MemoryCalibrationStore {
    profile: Mutex<CriticalSectionRawMutex, RefCell<Option<CalibrationProfile>>>,
}

impl MemoryCalibrationStore {
    pub const fn new() -> Self {
        Self {
            profile: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn with_profile(profile: CalibrationProfile) -> Self {
        Self {
            profile: Mutex::new(RefCell::new(Some(profile))),
        }
    }
}

impl Default for MemoryCalibrationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn load(&self) -> Result<Option<CalibrationProfile>, StorageError> {
        Ok(self.profile.lock(|p| p.borrow().clone()))
    }

    fn save(&self, profile: &CalibrationProfile) -> Result<(), StorageError> {
        self.profile
            .lock(|p| *p.borrow_mut() = Some(profile.clone()));
        Ok(())
    }

    fn delete(&self) -> Result<(), StorageError> {
        self.profile.lock(|p| p.borrow_mut().take());
        Ok(())
    }
}
