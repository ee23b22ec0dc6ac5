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
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Subscriber};

/// What an observer sees after every pressure sample.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightReading {
    pub smoothed_grams: f64,
    pub pressure: f64,
    pub is_stable: bool,
    pub is_calibrated: bool,
    pub calibration_error: Option<CalibrationError>,
}

impl WeightReading {
    pub(crate) fn idle(calibration_error: Option<CalibrationError>) -> Self {
        Self {
            smoothed_grams: 0.0,
            pressure: 0.0,
            is_stable: false,
            is_calibrated: false,
            calibration_error,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum WeightEvents {
    WeightUpdate(WeightReading),
    CalibrationLoaded(LinearModel),
    CalibrationFailed(CalibrationError),
    /// New tare offset in grams, zero after a reset
    TareUpdated(f64),
}

const CHANNEL_DEPTH: usize = 10;
const CHANNEL_SUBS: usize = 2;
const CHANNEL_PUBS: usize = 2;

pub type WeightChannel =
    PubSubChannel<CriticalSectionRawMutex, WeightEvents, CHANNEL_DEPTH, CHANNEL_SUBS, CHANNEL_PUBS>;
pub type WeightChannelSubscriber<'a> =
    Subscriber<'a, CriticalSectionRawMutex, WeightEvents, CHANNEL_DEPTH, CHANNEL_SUBS, CHANNEL_PUBS>;
