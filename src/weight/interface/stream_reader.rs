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

use crate::weight::interface::PressureSource;
use core::fmt;
use core::future::Future;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, trace, warn};
use portable_atomic::{AtomicBool, AtomicF64, Ordering};
use std::io::BufRead;
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamReaderError {
    AlreadyStarted,
    SpawnFailed(String),
}

impl fmt::Display for StreamReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamReaderError::AlreadyStarted => write!(f, "pressure stream already started"),
            StreamReaderError::SpawnFailed(e) => write!(f, "unable to start pressure reader: {}", e),
        }
    }
}

impl std::error::Error for StreamReaderError {}

/// Reads whitespace separated pressure values from a text stream on a
/// background thread, e.g. piped output from a platform sensor tool.
///
/// Tokens that do not parse, or parse to a non-finite value, are dropped here
/// so they never reach the estimation pipeline.
pub struct StreamPressureReader<R> {
    input: Option<R>,
    last_pressure: Arc<AtomicF64>,
    stop_requested: Arc<AtomicBool>,
    finished: Arc<Signal<CriticalSectionRawMutex, usize>>,
    worker: Option<JoinHandle<usize>>,
}

impl<R> StreamPressureReader<R>
where
    R: BufRead + Send + 'static,
{
    pub fn new(input: R) -> Self {
        Self {
            input: Some(input),
            last_pressure: Arc::new(AtomicF64::new(0.0)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(Signal::new()),
            worker: None,
        }
    }

    /// Resolves with the number of delivered samples once the stream ends.
    pub fn wait_finished(&self) -> impl Future<Output = usize> + '_ {
        self.finished.wait()
    }

    pub fn is_finished(&self) -> bool {
        self.worker
            .as_ref()
            .map(|worker| worker.is_finished())
            .unwrap_or(false)
    }

    /// Blocks until the stream is exhausted, returning the number of delivered samples.
    pub fn join(&mut self) -> usize {
        match self.worker.take().map(JoinHandle::join) {
            Some(Ok(count)) => count,
            Some(Err(_)) => {
                warn!("Pressure reader thread panicked");
                0
            }
            None => 0,
        }
    }
}

fn parse_sample(token: &str) -> Option<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        Ok(value) => {
            warn!("Discarding non-finite pressure sample {}", value);
            None
        }
        Err(_) => {
            warn!("Discarding unparsable pressure sample {:?}", token);
            None
        }
    }
}

impl<R> PressureSource for StreamPressureReader<R>
where
    R: BufRead + Send + 'static,
{
    type Error = StreamReaderError;

    fn start<H>(&mut self, mut handler: H) -> Result<(), Self::Error>
    where
        H: FnMut(f64) + Send + 'static,
    {
        let input = self.input.take().ok_or(StreamReaderError::AlreadyStarted)?;
        let last_pressure = self.last_pressure.clone();
        let stop_requested = self.stop_requested.clone();
        let finished = self.finished.clone();

        let worker = std::thread::Builder::new()
            .name("pressure-reader".into())
            .spawn(move || {
                let mut delivered = 0usize;
                'lines: for line in input.lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            warn!("Pressure stream read failed: {}", e);
                            break;
                        }
                    };
                    for token in line.split_whitespace() {
                        if stop_requested.load(Ordering::Relaxed) {
                            break 'lines;
                        }
                        if let Some(pressure) = parse_sample(token) {
                            last_pressure.store(pressure, Ordering::Release);
                            trace!("Pressure sample {}", pressure);
                            handler(pressure);
                            delivered += 1;
                        }
                    }
                }
                debug!("Pressure stream ended after {} samples", delivered);
                finished.signal(delivered);
                delivered
            })
            .map_err(|e| StreamReaderError::SpawnFailed(e.to_string()))?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop_requested.store(true, Ordering::Relaxed);
        // a worker blocked on input is left to finish on its own
        if self.is_finished() {
            self.join();
        }
    }

    fn last_pressure(&self) -> f64 {
        self.last_pressure.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[test]
    fn delivers_samples_in_order_and_skips_garbage() {
        let input = Cursor::new("0.1 0.2\nnope\n0.3 inf NaN\n\n0.4\n");
        let mut reader = StreamPressureReader::new(input);
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = received.clone();
        reader
            .start(move |p| sink.lock().unwrap().push(p))
            .unwrap();
        assert_eq!(reader.join(), 4);

        assert_eq!(*received.lock().unwrap(), vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(reader.last_pressure(), 0.4);
    }

    #[test]
    fn last_pressure_defaults_to_zero() {
        let reader = StreamPressureReader::new(Cursor::new(""));
        assert_eq!(reader.last_pressure(), 0.0);
    }

    #[test]
    fn cannot_start_twice() {
        let mut reader = StreamPressureReader::new(Cursor::new("1.0"));
        reader.start(|_| {}).unwrap();
        assert_eq!(reader.start(|_| {}), Err(StreamReaderError::AlreadyStarted));
        reader.join();
        reader.stop();
    }

    #[test]
    fn signals_completion() {
        let mut reader = StreamPressureReader::new(Cursor::new("0.5 0.5 0.5"));
        reader.start(|_| {}).unwrap();
        let delivered = embassy_futures::block_on(reader.wait_finished());
        assert_eq!(delivered, 3);
    }
}
