//! Logging initialization for clipfilter_app.
//!
//! Writes logs to `./clipfilter.log` in the current working directory so the
//! terminal stays free for the interactive session.

use std::fs::File;
use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, SharedLogger, TermLogger, TerminalMode, WriteLogger};

const LOG_FILE: &str = "./clipfilter.log";

/// Initialize the file logger.
///
/// If the log file cannot be created, only warnings and errors are shown on
/// the terminal instead.
pub fn initialize() {
    let config = clipfilter_logging::log_config();

    let logger: Box<dyn SharedLogger> = match create_file_logger() {
        Some(file_logger) => file_logger,
        None => TermLogger::new(
            LevelFilter::Warn,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    };

    let _ = CombinedLogger::init(vec![logger]);
}

fn create_file_logger() -> Option<Box<WriteLogger<File>>> {
    let log_path = PathBuf::from(LOG_FILE);
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(
            clipfilter_logging::default_level(),
            clipfilter_logging::log_config(),
            file,
        )),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}
