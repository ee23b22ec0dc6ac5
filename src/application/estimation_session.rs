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

use crate::application::CalibrationError;
use crate::calibration::LinearModel;
use crate::config::{ConfigError, EstimatorConfig};
use crate::storage::CalibrationStore;
use crate::weight::messaging::{WeightChannel, WeightEvents, WeightReading};
use crate::weight::{PressureSource, StabilityTracker, WeightEstimator};
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use log::{debug, trace, warn};
use portable_atomic::{AtomicF64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uncalibrated,
    Calibrated,
}

struct EstimationState {
    estimator: WeightEstimator,
    tracker: StabilityTracker,
    calibration_error: Option<CalibrationError>,
    latest: WeightReading,
}

impl EstimationState {
    fn is_calibrated(&self) -> bool {
        self.estimator.model().is_some()
    }

    fn replace_model(&mut self, model: Option<LinearModel>) {
        if self.estimator.model() == model {
            return;
        }
        match model {
            Some(model) => self.estimator.set_model(model),
            None => self.estimator.clear_model(),
        }
        // estimates made under the old model must not be averaged with new ones
        self.tracker.reset();
    }
}

/// Ties the calibration store, estimator and stability tracker to a stream of
/// pressure samples.
///
/// Every mutation of the session state happens under one lock, so samples
/// arriving on the sensor thread and commands from a UI or CLI are applied one
/// at a time. Each sample produces a [`WeightEvents::WeightUpdate`] on the
/// weight channel; publishing never waits for slow subscribers.
pub struct EstimationSession<'a, S> {
    store: S,
    state: Mutex<CriticalSectionRawMutex, RefCell<EstimationState>>,
    last_pressure: AtomicF64,
    weight_channel: &'a WeightChannel,
}

impl<'a, S> EstimationSession<'a, S>
where
    S: CalibrationStore,
{
    /// Starts uncalibrated; call [`Self::load_calibration`] to pick up a stored profile.
    pub fn new(
        store: S,
        config: &EstimatorConfig,
        weight_channel: &'a WeightChannel,
    ) -> Result<Self, ConfigError> {
        let tracker = StabilityTracker::new(config)?;
        let calibration_error = Some(CalibrationError::NotCalibrated);

        Ok(Self {
            store,
            state: Mutex::new(RefCell::new(EstimationState {
                estimator: WeightEstimator::new(),
                tracker,
                latest: WeightReading::idle(calibration_error.clone()),
                calibration_error,
            })),
            last_pressure: AtomicF64::new(0.0),
            weight_channel,
        })
    }

    /// Reads and fits the stored profile.
    ///
    /// Any failure leaves the session uncalibrated with the reason recorded;
    /// sample processing carries on regardless.
    pub fn load_calibration(&self) -> Result<LinearModel, CalibrationError> {
        let outcome = match self.store.load() {
            Ok(Some(profile)) => profile.fit().map_err(CalibrationError::from),
            Ok(None) => Err(CalibrationError::NotCalibrated),
            Err(e) => Err(CalibrationError::Storage(e)),
        };

        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            state.replace_model(outcome.as_ref().ok().copied());
            state.calibration_error = outcome.as_ref().err().cloned();
            state.latest.is_calibrated = state.is_calibrated();
            state.latest.calibration_error = state.calibration_error.clone();
        });

        match &outcome {
            Ok(model) => {
                debug!(
                    "Session calibrated: slope = {}, intercept = {}",
                    model.slope, model.intercept
                );
                self.publish(WeightEvents::CalibrationLoaded(*model));
            }
            Err(e) => {
                warn!("Session uncalibrated: {}", e);
                self.publish(WeightEvents::CalibrationFailed(e.clone()));
            }
        }
        outcome
    }

    /// The per-sample update path. Takes the state lock briefly and does no I/O.
    pub fn on_pressure_sample(&self, pressure: f64) -> WeightReading {
        self.last_pressure.store(pressure, Ordering::Release);

        let reading = self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            let raw_weight = state.estimator.estimate(pressure);
            let sample = state.tracker.push(raw_weight);
            let reading = WeightReading {
                smoothed_grams: sample.smoothed_grams,
                pressure,
                is_stable: sample.is_stable,
                is_calibrated: state.is_calibrated(),
                calibration_error: state.calibration_error.clone(),
            };
            state.latest = reading.clone();
            reading
        });

        trace!(
            "Pressure = {}, weight = {}, stable = {}",
            pressure, reading.smoothed_grams, reading.is_stable
        );
        self.publish(WeightEvents::WeightUpdate(reading.clone()));
        reading
    }

    /// Zeroes the reading at the most recently observed pressure.
    pub fn tare(&self) {
        let pressure = self.current_pressure();
        let offset = self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            state.estimator.tare(pressure);
            state.estimator.tare_offset()
        });
        debug!("Tared at pressure {}, offset = {}g", pressure, offset);
        self.publish(WeightEvents::TareUpdated(offset));
    }

    pub fn reset_tare(&self) {
        self.state
            .lock(|cell| cell.borrow_mut().estimator.reset_tare());
        debug!("Tare reset");
        self.publish(WeightEvents::TareUpdated(0.0));
    }

    pub fn reset_smoothing(&self) {
        self.state.lock(|cell| cell.borrow_mut().tracker.reset());
    }

    /// Last delivered pressure without taking the state lock. A sample may land
    /// concurrently, in which case either value can be returned.
    pub fn current_pressure(&self) -> f64 {
        self.last_pressure.load(Ordering::Acquire)
    }

    pub fn latest_reading(&self) -> WeightReading {
        self.state.lock(|cell| cell.borrow().latest.clone())
    }

    pub fn state(&self) -> SessionState {
        if self.is_calibrated() {
            SessionState::Calibrated
        } else {
            SessionState::Uncalibrated
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.state.lock(|cell| cell.borrow().is_calibrated())
    }

    pub fn calibration_error(&self) -> Option<CalibrationError> {
        self.state
            .lock(|cell| cell.borrow().calibration_error.clone())
    }

    pub fn model(&self) -> Option<LinearModel> {
        self.state.lock(|cell| cell.borrow().estimator.model())
    }

    pub fn tare_offset(&self) -> f64 {
        self.state
            .lock(|cell| cell.borrow().estimator.tare_offset())
    }

    /// Weight for `pressure` under the current model and tare, without smoothing
    /// and without touching the session state.
    pub fn estimate(&self, pressure: f64) -> f64 {
        self.state
            .lock(|cell| cell.borrow().estimator.estimate(pressure))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn publish(&self, event: WeightEvents) {
        self.weight_channel
            .immediate_publisher()
            .publish_immediate(event);
    }
}

impl<S> EstimationSession<'static, S>
where
    S: CalibrationStore + Send + Sync + 'static,
{
    /// Routes every sample delivered by `source` into this session.
    pub fn attach<P>(self: &Arc<Self>, source: &mut P) -> Result<(), P::Error>
    where
        P: PressureSource,
    {
        let session = Arc::clone(self);
        source.start(move |pressure| {
            session.on_pressure_sample(pressure);
        })
    }
}
