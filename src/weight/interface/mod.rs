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

pub mod stream_reader;

pub use stream_reader::{StreamPressureReader, StreamReaderError};

/// A source of pressure samples from the sensing surface.
pub trait PressureSource {
    type Error;

    /// Begin delivering samples. The handler is called once per sample, in
    /// arrival order, on whatever thread the source delivers from.
    fn start<H>(&mut self, handler: H) -> Result<(), Self::Error>
    where
        H: FnMut(f64) + Send + 'static;

    /// Stop delivering samples. Safe to call more than once.
    fn stop(&mut self);

    /// The most recently delivered sample, `0.0` before the first one. Never blocks.
    fn last_pressure(&self) -> f64;
}
