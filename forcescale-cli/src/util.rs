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

use forcescale::EstimatorConfig;
use log::LevelFilter;
use std::fs::File;
use std::io::{BufRead, BufReader, Error as IoError, ErrorKind, Result as IoResult};
use std::path::PathBuf;
use std::str::FromStr;
use strum::{Display, EnumString, VariantNames};

/// Flags that consume the following argument as their value
const VALUE_FLAGS: [&str; 7] = [
    "--log-level",
    "--profile",
    "--input",
    "--window",
    "--stability-threshold",
    "--weight",
    "--format",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Command {
    Calibrate,
    Measure,
    Tare,
    Export,
    Reset,
}

#[derive(Debug)]
pub(crate) struct CliOptions {
    pub command: Command,
    pub config: EstimatorConfig,
    pub profile_path: Option<PathBuf>,
    pub input_path: Option<PathBuf>,
    pub weight: Option<f64>,
    pub live: bool,
    pub tare: bool,
}

impl CliOptions {
    pub(crate) fn from_args(args: &[String]) -> IoResult<Self> {
        let mut config = EstimatorConfig::default();
        if let Some(window) = parse_option::<usize>(args, "--window")? {
            config.window_size = window;
        }
        if let Some(threshold) = parse_option::<f64>(args, "--stability-threshold")? {
            config.stability_threshold = threshold;
        }

        if let Some(format) = option_value(args, "--format") {
            if !format.eq_ignore_ascii_case("json") {
                return Err(IoError::new(
                    ErrorKind::InvalidInput,
                    format!("Unsupported export format: {}", format),
                ));
            }
        }

        Ok(Self {
            command: extract_command(args)?,
            config,
            profile_path: option_value(args, "--profile").map(PathBuf::from),
            input_path: option_value(args, "--input").map(PathBuf::from),
            weight: parse_option::<f64>(args, "--weight")?,
            live: args.iter().any(|a| a == "--live" || a == "-l"),
            tare: args.iter().any(|a| a == "--tare"),
        })
    }

    /// Pressure samples come from `--input` when given, stdin otherwise.
    pub(crate) fn open_input(&self) -> IoResult<Box<dyn BufRead + Send>> {
        match &self.input_path {
            Some(path) => {
                let file = File::open(path).map_err(|e| {
                    IoError::new(
                        ErrorKind::NotFound,
                        format!("Failed to open pressure input {}: {}", path.display(), e),
                    )
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            None => Ok(Box::new(BufReader::new(std::io::stdin()))),
        }
    }

    pub(crate) fn input_name(&self) -> String {
        self.input_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdin".to_string())
    }
}

pub(crate) fn parse_log_level(args: &[String]) -> LevelFilter {
    option_value(args, "--log-level")
        .map(|level_str| match level_str.to_uppercase().as_str() {
            "OFF" => LevelFilter::Off,
            "TRACE" => LevelFilter::Trace,
            "DEBUG" => LevelFilter::Debug,
            "INFO" => LevelFilter::Info,
            "WARN" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            _ => {
                eprintln!("Unknown log level: {}. Using WARN", level_str);
                LevelFilter::Warn
            }
        })
        .unwrap_or(LevelFilter::Warn)
}

/// An input that ended before delivering anything has no pressure to report.
pub(crate) fn require_samples(samples: usize) -> IoResult<usize> {
    if samples == 0 {
        return Err(IoError::new(
            ErrorKind::UnexpectedEof,
            "No pressure samples received",
        ));
    }
    Ok(samples)
}

pub(crate) fn to_io_error<E: std::fmt::Display>(e: E) -> IoError {
    IoError::new(ErrorKind::Other, e.to_string())
}

fn option_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_option<T: FromStr>(args: &[String], flag: &str) -> IoResult<Option<T>> {
    option_value(args, flag)
        .map(|value| {
            value.parse::<T>().map_err(|_| {
                IoError::new(
                    ErrorKind::InvalidInput,
                    format!("Invalid value for {}: {}", flag, value),
                )
            })
        })
        .transpose()
}

/// The first bare argument that is not the value of a preceding flag, `measure` if none.
fn extract_command(args: &[String]) -> IoResult<Command> {
    let command = args.iter().enumerate().find(|(i, arg)| {
        !arg.starts_with('-')
            && (*i == 0 || !VALUE_FLAGS.contains(&args[i - 1].as_str()))
    });

    match command {
        None => Ok(Command::Measure),
        Some((_, name)) => Command::from_str(name).map_err(|_| {
            IoError::new(
                ErrorKind::InvalidInput,
                format!(
                    "Unknown command: {}. Expected one of: {}",
                    name,
                    Command::VARIANTS.join(", ")
                ),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn defaults_to_measure() {
        let options = CliOptions::from_args(&args("--log-level debug")).unwrap();
        assert_eq!(options.command, Command::Measure);
        assert_eq!(options.config, EstimatorConfig::default());
        assert!(!options.live);
    }

    #[test]
    fn flag_values_are_not_commands() {
        let options =
            CliOptions::from_args(&args("--input samples.txt calibrate --weight 100")).unwrap();
        assert_eq!(options.command, Command::Calibrate);
        assert_eq!(options.weight, Some(100.0));
        assert_eq!(options.input_name(), "samples.txt");
    }

    #[test]
    fn overrides_estimator_config() {
        let options =
            CliOptions::from_args(&args("measure --live --tare --window 20 --stability-threshold 0.5"))
                .unwrap();
        assert!(options.live);
        assert!(options.tare);
        assert_eq!(options.config.window_size, 20);
        assert_eq!(options.config.stability_threshold, 0.5);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(CliOptions::from_args(&args("weigh")).is_err());
        assert!(CliOptions::from_args(&args("calibrate --weight heavy")).is_err());
        assert!(CliOptions::from_args(&args("export --format csv")).is_err());
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = require_samples(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert_eq!(require_samples(3).unwrap(), 3);
    }

    #[test]
    fn log_level_parsing() {
        assert_eq!(parse_log_level(&args("--log-level trace")), LevelFilter::Trace);
        assert_eq!(parse_log_level(&args("measure")), LevelFilter::Warn);
    }
}
