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

use crate::application::{CalibrationError, EstimationSession};
use crate::calibration::regression::MINIMUM_CALIBRATION_POINTS;
use crate::calibration::{
    CalibrationPoint, CalibrationProfile, FitError, LinearModel, DEFAULT_DEVICE_IDENTIFIER,
};
use crate::storage::{CalibrationStore, StorageError};
use core::fmt;
use log::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum WizardError {
    InvalidWeight(f64),
    NotEnoughPoints { points: usize },
    Storage(StorageError),
    Calibration(CalibrationError),
}

impl From<StorageError> for WizardError {
    fn from(err: StorageError) -> Self {
        WizardError::Storage(err)
    }
}

impl From<CalibrationError> for WizardError {
    fn from(err: CalibrationError) -> Self {
        WizardError::Calibration(err)
    }
}

impl fmt::Display for WizardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardError::InvalidWeight(grams) => {
                write!(f, "known weight must be a non-negative number of grams (got {})", grams)
            }
            WizardError::NotEnoughPoints { points } => write!(
                f,
                "record at least {} calibration points before saving ({} so far)",
                MINIMUM_CALIBRATION_POINTS, points
            ),
            WizardError::Storage(e) => write!(f, "{}", e),
            WizardError::Calibration(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for WizardError {}

/// Collects known-weight/pressure pairs for a device and hands the finished
/// profile to storage.
///
/// Nothing reaches storage until [`Self::save`] or [`Self::commit`], and then
/// the whole profile is written in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationWizard {
    profile: CalibrationProfile,
}

impl CalibrationWizard {
    pub fn new(device_identifier: impl Into<String>) -> Self {
        Self {
            profile: CalibrationProfile::new(device_identifier),
        }
    }

    /// Continues from the stored profile, or starts a fresh default one.
    pub fn resume<S: CalibrationStore>(store: &S) -> Result<Self, StorageError> {
        let profile = store
            .load()?
            .unwrap_or_else(|| CalibrationProfile::new(DEFAULT_DEVICE_IDENTIFIER));
        debug!("Calibration wizard resumed with {} points", profile.len());
        Ok(Self { profile })
    }

    pub fn record_point(&mut self, grams: f64, pressure: f64) -> Result<CalibrationPoint, WizardError> {
        if !(grams.is_finite() && grams >= 0.0) {
            return Err(WizardError::InvalidWeight(grams));
        }
        self.profile.add_point(grams, pressure);
        debug!("Recorded calibration point {}g at pressure {}", grams, pressure);
        Ok(CalibrationPoint::new(grams, pressure))
    }

    /// Records `grams` against whatever pressure the session saw last.
    pub fn record_from_session<S: CalibrationStore>(
        &mut self,
        grams: f64,
        session: &EstimationSession<'_, S>,
    ) -> Result<CalibrationPoint, WizardError> {
        self.record_point(grams, session.current_pressure())
    }

    pub fn remove_point(&mut self, index: usize) -> Option<CalibrationPoint> {
        self.profile.remove_point(index)
    }

    pub fn clear(&mut self) {
        self.profile.clear_points();
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        self.profile.points()
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    pub fn is_ready(&self) -> bool {
        self.profile.len() >= MINIMUM_CALIBRATION_POINTS
    }

    pub fn preview(&self) -> Result<LinearModel, FitError> {
        self.profile.fit()
    }

    /// Writes the profile as it stands, however many points it has.
    pub fn save<S: CalibrationStore>(&self, store: &S) -> Result<(), StorageError> {
        store.save(&self.profile)
    }

    /// Saves through the session's store and reloads the session's calibration.
    pub fn commit<S: CalibrationStore>(
        &self,
        session: &EstimationSession<'_, S>,
    ) -> Result<LinearModel, WizardError> {
        if !self.is_ready() {
            return Err(WizardError::NotEnoughPoints {
                points: self.profile.len(),
            });
        }
        self.save(session.store())?;
        let model = session.load_calibration()?;
        info!(
            "Calibration committed with {} points: slope = {:.2}, intercept = {:.2}",
            self.profile.len(),
            model.slope,
            model.intercept
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EstimatorConfig;
    use crate::storage::MemoryCalibrationStore;
    use crate::weight::WeightChannel;

    #[test]
    fn rejects_invalid_weights() {
        let mut wizard = CalibrationWizard::new("Default");
        assert_eq!(wizard.record_point(-1.0, 0.2), Err(WizardError::InvalidWeight(-1.0)));
        assert!(wizard.record_point(f64::NAN, 0.2).is_err());
        assert!(wizard.points().is_empty());
        // pressure sign is not checked
        assert!(wizard.record_point(0.0, -0.1).is_ok());
    }

    #[test]
    fn resume_continues_stored_profile() {
        let store = MemoryCalibrationStore::new();
        let fresh = CalibrationWizard::resume(&store).unwrap();
        assert_eq!(fresh.profile().device_identifier, DEFAULT_DEVICE_IDENTIFIER);
        assert!(fresh.points().is_empty());

        let mut wizard = fresh;
        wizard.record_point(50.0, 0.4).unwrap();
        wizard.save(&store).unwrap();

        let resumed = CalibrationWizard::resume(&store).unwrap();
        assert_eq!(resumed.points(), &[CalibrationPoint::new(50.0, 0.4)]);
    }

    #[test]
    fn commit_requires_two_points_and_calibrates_session() {
        let channel = WeightChannel::new();
        let session = EstimationSession::new(
            MemoryCalibrationStore::new(),
            &EstimatorConfig::default(),
            &channel,
        )
        .unwrap();
        let mut wizard = CalibrationWizard::new("Default");

        session.on_pressure_sample(0.0);
        wizard.record_from_session(0.0, &session).unwrap();
        assert_eq!(
            wizard.commit(&session),
            Err(WizardError::NotEnoughPoints { points: 1 })
        );
        assert_eq!(session.store().load(), Ok(None));

        session.on_pressure_sample(1.0);
        wizard.record_from_session(100.0, &session).unwrap();
        assert!(wizard.is_ready());
        assert_eq!(wizard.commit(&session), Ok(LinearModel::new(100.0, 0.0)));
        assert!(session.is_calibrated());
    }

    #[test]
    fn remove_and_clear() {
        let mut wizard = CalibrationWizard::new("Default");
        wizard.record_point(0.0, 0.0).unwrap();
        wizard.record_point(100.0, 1.0).unwrap();
        wizard.record_point(200.0, 2.0).unwrap();

        assert_eq!(wizard.remove_point(2), Some(CalibrationPoint::new(200.0, 2.0)));
        assert!(wizard.preview().is_ok());

        wizard.clear();
        assert!(!wizard.is_ready());
        assert_eq!(wizard.preview(), Err(FitError::InsufficientData { points: 0 }));
    }
}
