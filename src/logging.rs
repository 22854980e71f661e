// src/logging.rs

use crate::config::Config;
use crate::errors::{AskchatError, AskchatResult};
use crate::models::ApiCallLog;
use flexi_logger::{FileSpec, Logger, LoggerHandle, WriteMode};
use log::{info, warn};
use std::path::Path;

pub const API_LOG_TARGET: &str = "askchat::api";

/// Starts the file logger. Nothing is written to the terminal, which belongs to
/// the chat screen.
pub fn init_logging(config: &Config) -> AskchatResult<LoggerHandle> {
    let path = Path::new(&config.log_file);
    let mut file_spec = FileSpec::try_from(path)
        .map_err(|e| AskchatError::Logger(format!("Invalid log file {}: {}", config.log_file, e)))?;
    if path.parent().map_or(true, |p| p.as_os_str().is_empty()) {
        file_spec = file_spec.directory(".");
    }

    Logger::try_with_str(&config.log_level)
        .map_err(|e| AskchatError::Logger(e.to_string()))?
        .log_to_file(file_spec)
        .append()
        .write_mode(WriteMode::BufferAndFlush)
        .start()
        .map_err(|e| AskchatError::Logger(e.to_string()))
}

/// Logs a call to the answer service.
pub fn log_api_call(log: &ApiCallLog) {
    if log.response_status == 0 || log.response_status >= 400 {
        warn!(
            target: API_LOG_TARGET,
            "[{}] {} - {} - Status: {} - Time: {}ms",
            log.timestamp.to_rfc3339(),
            log.endpoint,
            log.request_summary,
            log.response_status,
            log.response_time_ms
        );
    } else {
        info!(
            target: API_LOG_TARGET,
            "[{}] {} - {} - Status: {} - Time: {}ms",
            log.timestamp.to_rfc3339(),
            log.endpoint,
            log.request_summary,
            log.response_status,
            log.response_time_ms
        );
    }
}

/// Shortens a question for the call log.
pub fn summarize(question: &str) -> String {
    const LIMIT: usize = 60;
    match question.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &question[..cut]),
        None => question.to_string(),
    }
}
