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

//! Weight estimation from a pressure-sensing surface.
//!
//! Pressure samples flow through an [`EstimationSession`], which converts them
//! to grams with a least-squares [`LinearModel`] fitted from the stored
//! [`CalibrationProfile`], subtracts the tare offset, smooths the result and
//! flags when it has settled. Updates are published on a [`WeightChannel`].

pub mod application;
pub mod calibration;
pub mod config;
pub mod storage;
pub mod weight;

pub use application::{
    CalibrationError, CalibrationWizard, EstimationSession, SessionState, WizardError,
};
pub use calibration::{CalibrationPoint, CalibrationProfile, FitError, LinearModel};
pub use config::{ConfigError, EstimatorConfig};
pub use storage::{CalibrationStore, JsonCalibrationStore, MemoryCalibrationStore, StorageError};
pub use weight::{
    PressureSource, StabilityTracker, WeightChannel, WeightChannelSubscriber, WeightEstimator,
    WeightEvents, WeightReading,
};
