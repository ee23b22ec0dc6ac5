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

mod util;

use embassy_futures::block_on;
use embassy_futures::select::{select, Either};
use forcescale::weight::interface::StreamPressureReader;
use forcescale::{
    CalibrationStore, CalibrationWizard, EstimationSession, JsonCalibrationStore, PressureSource,
    WeightChannel, WeightEvents, WeightReading,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Error as IoError, ErrorKind, Result as IoResult};
use std::sync::Arc;
use util::{parse_log_level, require_samples, to_io_error, CliOptions, Command};

static WEIGHT_CHANNEL: WeightChannel = WeightChannel::new();

/// Bar length in hundredths of the normalised pressure range
const PRESSURE_BAR_RESOLUTION: u64 = 100;

fn main() -> IoResult<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    env_logger::Builder::from_default_env()
        .filter_level(parse_log_level(&args))
        .format_timestamp_millis()
        .init();

    let options = CliOptions::from_args(&args)?;
    let store = match &options.profile_path {
        Some(path) => JsonCalibrationStore::new(path),
        None => JsonCalibrationStore::in_home_directory().map_err(to_io_error)?,
    };
    log::debug!("Using calibration file {}", store.path().display());

    match options.command {
        Command::Calibrate => calibrate(&options, &store),
        Command::Measure => measure(&options, store),
        Command::Tare => {
            println!("Tare is applied during live measurement sessions.");
            println!(
                "Run 'forcescale measure --live --tare' to zero on the first stable reading."
            );
            println!("Tare state is not persisted between runs.");
            Ok(())
        }
        Command::Export => export(&store),
        Command::Reset => {
            store.delete().map_err(to_io_error)?;
            println!("Calibration deleted.");
            Ok(())
        }
    }
}

fn calibrate(options: &CliOptions, store: &JsonCalibrationStore) -> IoResult<()> {
    let weight = options.weight.ok_or_else(|| {
        IoError::new(
            ErrorKind::InvalidInput,
            "calibrate requires --weight <grams>",
        )
    })?;

    println!("Calibrating with {}g...", weight);
    println!(
        "Place the object on the surface. Reading pressure from {}",
        options.input_name()
    );

    let mut reader = StreamPressureReader::new(options.open_input()?);
    reader.start(|_| {}).map_err(to_io_error)?;
    let samples = require_samples(reader.join())?;
    let pressure = reader.last_pressure();
    log::info!("Captured pressure {} after {} samples", pressure, samples);

    let mut wizard = CalibrationWizard::resume(store).map_err(to_io_error)?;
    wizard.record_point(weight, pressure).map_err(to_io_error)?;
    wizard.save(store).map_err(to_io_error)?;
    println!(
        "Calibration point saved: {}g at pressure {:.4} ({} point(s) total)",
        weight,
        pressure,
        wizard.points().len()
    );

    match wizard.preview() {
        Ok(model) => println!(
            "Current Calibration: Slope={:.2}, Intercept={:.2}",
            model.slope, model.intercept
        ),
        Err(e) => println!("{}", e),
    }
    Ok(())
}

fn measure(options: &CliOptions, store: JsonCalibrationStore) -> IoResult<()> {
    let session = Arc::new(
        EstimationSession::new(store, &options.config, &WEIGHT_CHANNEL).map_err(to_io_error)?,
    );

    if let Err(e) = session.load_calibration() {
        log::error!("{}", e);
        println!(
            "Error: Device not calibrated. Please run 'forcescale calibrate --weight <grams>' first."
        );
        return Ok(());
    }

    let mut reader = StreamPressureReader::new(options.open_input()?);
    if options.live {
        return measure_live(&session, &mut reader, options.tare);
    }

    session.attach(&mut reader).map_err(to_io_error)?;
    let samples = require_samples(reader.join())?;
    log::info!("Input ended after {} samples", samples);
    println!(
        "Estimated Weight: {:.2}g",
        session.estimate(session.current_pressure())
    );
    Ok(())
}

fn measure_live<R>(
    session: &Arc<EstimationSession<'static, JsonCalibrationStore>>,
    reader: &mut StreamPressureReader<R>,
    tare_on_stable: bool,
) -> IoResult<()>
where
    R: BufRead + Send + 'static,
{
    let mut subscriber = WEIGHT_CHANNEL
        .subscriber()
        .map_err(|_| IoError::new(ErrorKind::Other, "No free weight channel subscriber"))?;

    let bar = ProgressBar::new(PRESSURE_BAR_RESOLUTION);
    bar.set_style(
        ProgressStyle::with_template("[{bar:30.cyan/blue}] {msg}")
            .map_err(to_io_error)?
            .progress_chars("#>-"),
    );

    session.attach(reader).map_err(to_io_error)?;
    let mut tare_pending = tare_on_stable;

    loop {
        let event = block_on(select(
            subscriber.next_message_pure(),
            reader.wait_finished(),
        ));
        match event {
            Either::First(WeightEvents::WeightUpdate(reading)) => {
                // first settled reading becomes the zero reference
                if reading.is_stable && tare_pending {
                    session.tare();
                    session.reset_smoothing();
                    tare_pending = false;
                    bar.println(format!("Tared at pressure {:.4}", reading.pressure));
                    continue;
                }
                render(&bar, &reading);
            }
            Either::First(WeightEvents::TareUpdated(offset)) => {
                log::debug!("Tare offset now {:.2}g", offset);
            }
            Either::First(_) => {}
            Either::Second(samples) => {
                while let Some(event) = subscriber.try_next_message_pure() {
                    if let WeightEvents::WeightUpdate(reading) = event {
                        render(&bar, &reading);
                    }
                }
                bar.finish();
                log::info!("Input ended after {} samples", samples);
                break;
            }
        }
    }

    reader.join();
    Ok(())
}

fn render(bar: &ProgressBar, reading: &WeightReading) {
    let position = (reading.pressure.clamp(0.0, 1.0) * PRESSURE_BAR_RESOLUTION as f64) as u64;
    bar.set_position(position);
    bar.set_message(format!(
        "Weight: {:>8.2}g | P: {:.3} | {}",
        reading.smoothed_grams,
        reading.pressure,
        if reading.is_stable { "stable" } else { "settling" }
    ));
}

fn export(store: &JsonCalibrationStore) -> IoResult<()> {
    match store.load().map_err(to_io_error)? {
        Some(profile) => {
            let json = serde_json::to_string_pretty(&profile).map_err(to_io_error)?;
            println!("{}", json);
        }
        None => println!("No profile found."),
    }
    Ok(())
}
