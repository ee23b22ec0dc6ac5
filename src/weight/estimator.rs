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

use crate::calibration::LinearModel;
use log::{debug, trace};

/// Converts pressure into grams using the active model, less the tare offset.
///
/// With no model installed every estimate is `0.0`; being uncalibrated is a
/// normal state here and is reported by the session, not by this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightEstimator {
    model: Option<LinearModel>,
    tare_offset: f64,
}

impl WeightEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: LinearModel) -> Self {
        Self {
            model: Some(model),
            tare_offset: 0.0,
        }
    }

    /// Replaces the model. The tare offset is kept even though it was taken
    /// under the previous model; callers decide when to reset it.
    pub fn set_model(&mut self, model: LinearModel) {
        debug!(
            "Calibration updated: slope = {}, intercept = {}",
            model.slope, model.intercept
        );
        self.model = Some(model);
    }

    pub fn clear_model(&mut self) {
        if self.model.take().is_some() {
            debug!("Calibration model cleared");
        }
    }

    pub fn model(&self) -> Option<LinearModel> {
        self.model
    }

    pub fn tare_offset(&self) -> f64 {
        self.tare_offset
    }

    /// Model output for `pressure` before tare and clamping.
    pub fn raw_output(&self, pressure: f64) -> Option<f64> {
        self.model.map(|m| m.apply(pressure))
    }

    /// Does nothing without a model, so an earlier offset survives.
    pub fn tare(&mut self, current_pressure: f64) {
        match self.raw_output(current_pressure) {
            Some(raw) => {
                self.tare_offset = raw;
                trace!(
                    "Tare offset = {} at pressure {}",
                    self.tare_offset, current_pressure
                );
            }
            None => trace!("Tare ignored at pressure {}, no model", current_pressure),
        }
    }

    pub fn reset_tare(&mut self) {
        self.tare_offset = 0.0;
        trace!("Tare offset reset");
    }

    /// Never negative: loads below the tare reference read as exactly zero.
    pub fn estimate(&self, pressure: f64) -> f64 {
        match self.raw_output(pressure) {
            Some(raw) => (raw - self.tare_offset).max(0.0),
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn uncalibrated_reads_zero() {
        let estimator = WeightEstimator::new();
        assert_eq!(estimator.estimate(0.0), 0.0);
        assert_eq!(estimator.estimate(12.5), 0.0);
        assert_eq!(estimator.raw_output(1.0), None);
    }

    #[test]
    fn tare_zeroes_current_load() {
        let mut estimator = WeightEstimator::with_model(LinearModel::new(100.0, 3.0));
        estimator.tare(0.37);
        assert!(estimator.estimate(0.37).abs() < 1e-9);
        assert!((estimator.estimate(0.87) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn reset_tare_restores_model_output() {
        let mut estimator = WeightEstimator::with_model(LinearModel::new(100.0, -5.0));
        estimator.tare(0.5);
        estimator.reset_tare();
        assert_eq!(estimator.tare_offset(), 0.0);
        assert!((estimator.estimate(0.5) - 45.0).abs() < 1e-9);
        // model output is negative here, so it clamps
        assert_eq!(estimator.estimate(0.01), 0.0);
    }

    #[test]
    fn removing_load_below_tare_reads_zero() {
        let mut estimator = WeightEstimator::with_model(LinearModel::new(100.0, 0.0));
        estimator.tare(0.6);
        assert_eq!(estimator.estimate(0.2), 0.0);
    }

    #[test]
    fn replacing_model_keeps_tare() {
        let mut estimator = WeightEstimator::with_model(LinearModel::new(100.0, 0.0));
        estimator.tare(0.2);
        estimator.set_model(LinearModel::new(200.0, 0.0));
        assert_eq!(estimator.tare_offset(), 20.0);
        assert!((estimator.estimate(0.5) - 80.0).abs() < 1e-9);

        estimator.clear_model();
        assert_eq!(estimator.tare_offset(), 20.0);
        assert_eq!(estimator.estimate(0.5), 0.0);
    }

    #[test]
    fn tare_without_model_keeps_offset() {
        let mut estimator = WeightEstimator::new();
        estimator.tare(0.8);
        assert_eq!(estimator.tare_offset(), 0.0);

        let mut estimator = WeightEstimator::with_model(LinearModel::new(100.0, 0.0));
        estimator.tare(0.3);
        estimator.clear_model();
        estimator.tare(0.9);
        assert_eq!(estimator.tare_offset(), 30.0);

        estimator.set_model(LinearModel::new(100.0, 0.0));
        assert!(estimator.estimate(0.3).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn estimate_is_never_negative(
            slope in -1.0e6f64..1.0e6,
            intercept in -1.0e6f64..1.0e6,
            tare_pressure in -100.0f64..100.0,
            pressure in -100.0f64..100.0,
            apply_tare in any::<bool>(),
        ) {
            let mut estimator = WeightEstimator::with_model(LinearModel::new(slope, intercept));
            if apply_tare {
                estimator.tare(tare_pressure);
            }
            prop_assert!(estimator.estimate(pressure) >= 0.0);
        }
    }
}
