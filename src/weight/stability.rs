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

use crate::config::{ConfigError, EstimatorConfig, MAX_WINDOW_SIZE};
use circular_buffer::CircularBuffer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilitySample {
    pub smoothed_grams: f64,
    pub is_stable: bool,
}

/// Moving average over the most recent raw weights plus a settled/unsettled flag.
///
/// A window that is not yet full is always reported as unstable so that a
/// cold start cannot be mistaken for a settled load.
pub struct StabilityTracker {
    window: CircularBuffer<MAX_WINDOW_SIZE, f64>,
    window_size: usize,
    stability_threshold: f64,
}

impl StabilityTracker {
    pub fn new(config: &EstimatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            window: CircularBuffer::new(),
            window_size: config.window_size,
            stability_threshold: config.stability_threshold,
        })
    }

    pub fn push(&mut self, raw_weight: f64) -> StabilitySample {
        self.window.push_back(raw_weight);
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }

        let smoothed_grams = self.mean();
        let is_stable = self.is_full() && self.std_dev(smoothed_grams) < self.stability_threshold;

        StabilitySample {
            smoothed_grams,
            is_stable,
        }
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.window_size
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn stability_threshold(&self) -> f64 {
        self.stability_threshold
    }

    fn mean(&self) -> f64 {
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    // population, not sample, deviation
    fn std_dev(&self, mean: f64) -> f64 {
        let variance = self
            .window
            .iter()
            .map(|w| (w - mean) * (w - mean))
            .sum::<f64>()
            / self.window.len() as f64;
        variance.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tracker(window_size: usize, stability_threshold: f64) -> StabilityTracker {
        StabilityTracker::new(&EstimatorConfig {
            window_size,
            stability_threshold,
        })
        .unwrap()
    }

    #[test]
    fn never_stable_before_window_fills() {
        let mut t = tracker(10, 0.05);
        for _ in 0..9 {
            let sample = t.push(42.0);
            assert!(!sample.is_stable);
            assert_eq!(sample.smoothed_grams, 42.0);
        }
        assert!(t.push(42.0).is_stable);
    }

    #[test]
    fn noisy_full_window_is_unstable() {
        let mut t = tracker(4, 0.05);
        let mut last = None;
        for w in [10.0, 10.2, 9.8, 10.0] {
            last = Some(t.push(w));
        }
        let last = last.unwrap();
        assert!((last.smoothed_grams - 10.0).abs() < 1e-9);
        // population std dev is ~0.141
        assert!(!last.is_stable);
    }

    #[test]
    fn threshold_is_strict() {
        // values 0 and 0.1 alternate: population std dev is exactly 0.05
        let mut t = tracker(2, 0.05);
        t.push(0.0);
        assert!(!t.push(0.1).is_stable);
    }

    #[test]
    fn oldest_values_are_evicted() {
        let mut t = tracker(3, 0.05);
        for w in [100.0, 1.0, 2.0, 3.0] {
            t.push(w);
        }
        assert_eq!(t.len(), 3);
        let sample = t.push(4.0);
        assert!((sample.smoothed_grams - 3.0).abs() < 1e-12);
    }

    #[test]
    fn reset_empties_window() {
        let mut t = tracker(3, 0.05);
        for _ in 0..3 {
            t.push(5.0);
        }
        assert!(t.is_full());
        t.reset();
        assert!(t.is_empty());
        assert!(!t.push(5.0).is_stable);
    }

    #[test]
    fn non_finite_values_propagate() {
        let mut t = tracker(3, 0.05);
        t.push(1.0);
        let sample = t.push(f64::NAN);
        assert!(sample.smoothed_grams.is_nan());
        assert!(!sample.is_stable);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = EstimatorConfig {
            window_size: 0,
            ..Default::default()
        };
        assert!(StabilityTracker::new(&config).is_err());
    }

    proptest! {
        #[test]
        fn smoothed_weight_is_mean_of_last_window(
            window_size in 1usize..=MAX_WINDOW_SIZE,
            values in prop::collection::vec(0.0f64..5000.0, 1..200),
        ) {
            let mut t = tracker(window_size, 0.05);
            let mut last = None;
            for &v in &values {
                last = Some(t.push(v));
            }

            let tail = &values[values.len().saturating_sub(window_size)..];
            let expected = tail.iter().sum::<f64>() / tail.len() as f64;

            prop_assert_eq!(t.len(), window_size.min(values.len()));
            prop_assert!((last.unwrap().smoothed_grams - expected).abs() <= 1e-6);
            if values.len() < window_size {
                prop_assert!(!last.unwrap().is_stable);
            }
        }
    }
}
