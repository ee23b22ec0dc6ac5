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

use core::fmt;

pub const DEFAULT_WINDOW_SIZE: usize = 10;
/// Population standard deviation, in grams, below which a full window counts as stable
pub const DEFAULT_STABILITY_THRESHOLD: f64 = 0.05;
/// Upper bound on the smoothing window, fixed by the tracker's backing buffer
pub const MAX_WINDOW_SIZE: usize = 64;

pub struct NumericSettingProperties<T> {
    pub minimum_value: T,
    pub maximum_value: T,
}

pub const WINDOW_SIZE_PROPERTIES: NumericSettingProperties<usize> = NumericSettingProperties {
    minimum_value: 1,
    maximum_value: MAX_WINDOW_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    WindowSizeOutOfRange(usize),
    InvalidStabilityThreshold(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::WindowSizeOutOfRange(size) => write!(
                f,
                "smoothing window of {} samples is outside {}..={}",
                size, WINDOW_SIZE_PROPERTIES.minimum_value, WINDOW_SIZE_PROPERTIES.maximum_value
            ),
            ConfigError::InvalidStabilityThreshold(threshold) => write!(
                f,
                "stability threshold must be a positive, finite number of grams (got {})",
                threshold
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    pub window_size: usize,
    pub stability_threshold: f64,
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size < WINDOW_SIZE_PROPERTIES.minimum_value
            || self.window_size > WINDOW_SIZE_PROPERTIES.maximum_value
        {
            return Err(ConfigError::WindowSizeOutOfRange(self.window_size));
        }
        if !(self.stability_threshold.is_finite() && self.stability_threshold > 0.0) {
            return Err(ConfigError::InvalidStabilityThreshold(
                self.stability_threshold,
            ));
        }
        Ok(())
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
        }
    }
}
