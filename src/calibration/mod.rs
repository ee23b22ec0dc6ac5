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

pub mod regression;

use serde::{Deserialize, Serialize};

pub use regression::{fit, FitError};

pub const DEFAULT_DEVICE_IDENTIFIER: &str = "Default";

/// One ground-truth observation: a known mass and the pressure it produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub grams: f64,
    pub pressure: f64,
}

impl CalibrationPoint {
    pub const fn new(grams: f64, pressure: f64) -> Self {
        Self { grams, pressure }
    }
}

/// Calibration history for a single device, in the order points were captured.
///
/// The serialized form is `{"deviceIdentifier": "...", "points": [{"grams": .., "pressure": ..}]}`
/// and must stay that way so existing calibration files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationProfile {
    pub device_identifier: String,
    #[serde(default)]
    pub points: Vec<CalibrationPoint>,
}

impl CalibrationProfile {
    pub fn new(device_identifier: impl Into<String>) -> Self {
        Self {
            device_identifier: device_identifier.into(),
            points: Vec::new(),
        }
    }

    pub fn with_points(device_identifier: impl Into<String>, points: Vec<CalibrationPoint>) -> Self {
        Self {
            device_identifier: device_identifier.into(),
            points,
        }
    }

    /// Appends a point. Callers are expected to pass `grams >= 0`; pressure is taken as-is.
    pub fn add_point(&mut self, grams: f64, pressure: f64) {
        self.points.push(CalibrationPoint::new(grams, pressure));
    }

    pub fn remove_point(&mut self, index: usize) -> Option<CalibrationPoint> {
        if index < self.points.len() {
            Some(self.points.remove(index))
        } else {
            None
        }
    }

    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Least-squares model for the current points.
    pub fn fit(&self) -> Result<LinearModel, FitError> {
        fit(&self.points)
    }
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_IDENTIFIER)
    }
}

/// `weight = slope * pressure + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    pub const fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    #[inline]
    pub fn apply(&self, pressure: f64) -> f64 {
        self.slope * pressure + self.intercept
    }
}
