// src/logging.rs

use crate::{
    config::Config,
    errors::ConsejeroResult,
    models::ApiCallLog,
};
use flexi_logger::{detailed_format, FileSpec, Logger, LoggerHandle};

/// Starts the file logger. The terminal UI owns stdout, so nothing is
/// written there. `RUST_LOG` takes precedence over `log_level`.
pub fn init_logging(config: &Config) -> ConsejeroResult<LoggerHandle> {
    std::fs::create_dir_all(&config.log_dir)?;

    let handle = Logger::try_with_env_or_str(&config.log_level)?
        .log_to_file(
            FileSpec::default()
                .directory(&config.log_dir)
                .basename("consejero"),
        )
        .append()
        .format_for_files(detailed_format)
        .start()?;

    Ok(handle)
}

/// Writes an API call record to the log.
pub fn log_api_call(log: &ApiCallLog) {
    log::info!(
        "[{}] {} - {} - Status: {} - Time: {}ms",
        log.timestamp.to_rfc3339(),
        log.endpoint,
        log.request_summary,
        log.response_status,
        log.response_time_ms
    );
}
