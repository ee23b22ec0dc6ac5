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

use crate::calibration::{CalibrationPoint, LinearModel};
use core::fmt;

pub const MINIMUM_CALIBRATION_POINTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitError {
    /// Fewer than two points, value is the number of points available
    InsufficientData { points: usize },
    /// Every point has the same pressure, so the slope is undefined
    DegenerateData,
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::InsufficientData { points } => write!(
                f,
                "insufficient calibration data: {} point(s), at least {} required",
                points, MINIMUM_CALIBRATION_POINTS
            ),
            FitError::DegenerateData => {
                write!(f, "degenerate calibration data: all points share the same pressure")
            }
        }
    }
}

impl std::error::Error for FitError {}

/// Ordinary least-squares fit of grams (y) on pressure (x).
///
/// Every point carries equal weight and no outliers are rejected.
pub fn fit(points: &[CalibrationPoint]) -> Result<LinearModel, FitError> {
    if points.len() < MINIMUM_CALIBRATION_POINTS {
        return Err(FitError::InsufficientData {
            points: points.len(),
        });
    }

    let n = points.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_x2) = points.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2), p| {
            (
                sx + p.pressure,
                sy + p.grams,
                sxy + p.pressure * p.grams,
                sx2 + p.pressure * p.pressure,
            )
        },
    );

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        log::debug!("Calibration fit rejected, zero pressure variance over {} points", points.len());
        return Err(FitError::DegenerateData);
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    log::trace!("Calibration fit: slope = {}, intercept = {}", slope, intercept);

    Ok(LinearModel { slope, intercept })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-9 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn recovers_exact_line() {
        let points: Vec<_> = [0.12, 0.4, 0.75, 1.3, 2.0]
            .iter()
            .map(|&x| CalibrationPoint::new(-37.5 * x + 12.25, x))
            .collect();

        let model = fit(&points).unwrap();
        assert_close(model.slope, -37.5);
        assert_close(model.intercept, 12.25);
    }

    #[test]
    fn two_point_calibration() {
        let points = [CalibrationPoint::new(0.0, 0.0), CalibrationPoint::new(100.0, 1.0)];
        let model = fit(&points).unwrap();
        assert_close(model.slope, 100.0);
        assert_close(model.intercept, 0.0);
    }

    #[test]
    fn order_does_not_matter() {
        let forward = [
            CalibrationPoint::new(10.0, 0.1),
            CalibrationPoint::new(55.0, 0.4),
            CalibrationPoint::new(70.0, 0.9),
        ];
        let mut reversed = forward;
        reversed.reverse();

        let a = fit(&forward).unwrap();
        let b = fit(&reversed).unwrap();
        assert_close(a.slope, b.slope);
        assert_close(a.intercept, b.intercept);
    }

    #[test]
    fn duplicate_points_are_counted() {
        let points = [
            CalibrationPoint::new(0.0, 0.0),
            CalibrationPoint::new(100.0, 1.0),
            CalibrationPoint::new(100.0, 1.0),
        ];
        let model = fit(&points).unwrap();
        assert_close(model.slope, 100.0);
        assert_close(model.intercept, 0.0);
    }

    #[test]
    fn too_few_points() {
        assert_eq!(fit(&[]), Err(FitError::InsufficientData { points: 0 }));
        assert_eq!(
            fit(&[CalibrationPoint::new(50.0, 0.3)]),
            Err(FitError::InsufficientData { points: 1 })
        );
    }

    #[test]
    fn identical_pressures_are_degenerate() {
        let points = [
            CalibrationPoint::new(0.0, 0.5),
            CalibrationPoint::new(100.0, 0.5),
            CalibrationPoint::new(250.0, 0.5),
        ];
        assert_eq!(fit(&points), Err(FitError::DegenerateData));
    }
}
