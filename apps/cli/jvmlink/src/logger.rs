//! Log setup for the `jvmlink` binary.
//!
//! Records go to stderr (coloured) and to `jvmlink.log`. Stdout carries only
//! session output, so it stays safe to pipe.

use crate::error::AppError;

use common::ErrorLocation;

use std::fmt::{Arguments, Display};
use std::fs::File;
use std::io::stderr;
use std::panic::Location;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::{Dispatch, FormatCallback};
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

/// Set by the first caller; later calls only validate their log directory.
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "jvmlink.log";

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Install the global logger, writing to stderr and `log_dir/jvmlink.log`.
///
/// The log file is opened on every call, so an unusable directory is always
/// reported. The logger itself is installed by the first call only.
pub fn initialize(log_dir: &Path) -> Result<(), AppError> {
    let log_file = open_log_file(log_dir)?;

    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_file);
        if result.is_ok() {
            info!("{LOGGER_INITIALIZED_MESSAGE_PREFIX}{LOG_LEVEL:?}");
        }
    });

    result
}

#[track_caller]
fn open_log_file(log_dir: &Path) -> Result<File, AppError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    fern::log_file(&log_file_path).map_err(|e| AppError::App {
        message: format!("Failed to create log file {}: {e}", log_file_path.display()),
        location: ErrorLocation::from(Location::caller()),
    })
}

#[track_caller]
fn initialize_internal(log_file: File) -> Result<(), AppError> {
    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let console = Dispatch::new()
        .format(move |out, message, record| {
            write_record(out, message, record, colors.color(record.level()))
        })
        .chain(stderr());

    // The log file never gets ANSI escapes.
    let file = Dispatch::new()
        .format(|out, message, record| write_record(out, message, record, record.level()))
        .chain(log_file);

    Dispatch::new()
        .level(LOG_LEVEL)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(|e| AppError::App {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}

fn write_record(
    out: FormatCallback<'_>,
    message: &Arguments<'_>,
    record: &Record<'_>,
    level: impl Display,
) {
    out.finish(format_args!(
        "[{date} - {level}] {message} [{file}:{line}]",
        date = format_rfc3339(SystemTime::now()),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}
