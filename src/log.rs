//! Initialisation of the program logger.
//!
//! Messages go to the terminal (coloured if it supports it) and, for model runs, to log files in
//! the output folder.
use anyhow::{Context, Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// A flag indicating whether the logger has been initialised
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The default log level for the program.
///
/// Used as a fallback if the user hasn't specified something else with the
/// `BLUECARBON_LOG_LEVEL` environment variable or the settings.toml file.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The environment variable which overrides the log level
const LOG_LEVEL_ENV_VAR: &str = "BLUECARBON_LOG_LEVEL";

/// The file name for the log file containing messages about the ordinary operation of a run
const LOG_INFO_FILE_NAME: &str = "bluecarbon_info.log";

/// The file name for the log file containing warnings and error messages
const LOG_ERROR_FILE_NAME: &str = "bluecarbon_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Initialise the program logger.
///
/// The level is taken from the `BLUECARBON_LOG_LEVEL` environment variable if it is set,
/// otherwise from `settings.toml`, otherwise [`DEFAULT_LOG_LEVEL`]. Recognised levels are `off`,
/// `error`, `warn`, `info`, `debug` and `trace`.
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `log_file_path`: Folder in which to create log files, if any
pub fn init(log_level_from_settings: Option<&str>, log_file_path: Option<&Path>) -> Result<()> {
    let log_level = resolve_log_level(log_level_from_settings)?;

    let mut dispatch = terminal_dispatch(log_level);
    if let Some(log_file_path) = log_file_path {
        dispatch = dispatch.chain(log_file_dispatch(log_file_path, log_level)?);
    }

    dispatch.apply().context("Logger already initialised")?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

/// Work out the log level, with the environment variable taking precedence over settings
fn resolve_log_level(log_level_from_settings: Option<&str>) -> Result<LevelFilter> {
    match env::var(LOG_LEVEL_ENV_VAR) {
        Ok(log_level) => parse_log_level(&log_level),
        Err(_) => parse_log_level(log_level_from_settings.unwrap_or(DEFAULT_LOG_LEVEL)),
    }
}

/// Messages below warning level go to stdout; warnings and errors go to stderr.
///
/// Levels are coloured when the stream is a terminal.
fn terminal_dispatch(log_level: LevelFilter) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let use_colour_stdout = std::io::stdout().is_terminal();
    let use_colour_stderr = std::io::stderr().is_terminal();

    Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stdout, &colours);
                })
                .level(log_level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stderr, &colours);
                })
                .level(log_level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        )
}

/// Log files for a model run.
///
/// The info log records at least `info` level, whatever the terminal level. The error log records
/// warnings and errors.
fn log_file_dispatch(dir_path: &Path, log_level: LevelFilter) -> Result<Dispatch> {
    let new_log_file = |file_name: &str| {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(dir_path.join(file_name))
            .with_context(|| format!("Could not create log file {file_name}"))
    };

    Ok(Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(write_log_plain)
                .level(log_level.max(LevelFilter::Info))
                .chain(new_log_file(LOG_INFO_FILE_NAME)?),
        )
        .chain(
            Dispatch::new()
                .format(write_log_plain)
                .level(LevelFilter::Warn)
                .chain(new_log_file(LOG_ERROR_FILE_NAME)?),
        ))
}

/// Convert a log level name into a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    Ok(match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    })
}

/// Write a log message with a timestamp, level and target
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

/// Write to the log with no colours
fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

/// Write to the log with optional colours
fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    // Format output with or without colour based on `use_colour`
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log_plain(out, message, record);
    }
}
