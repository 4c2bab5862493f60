//! Logger and logging macros
//!
//! For the macros to properly compile, the calling crate must add a dependency to
//! crate log (ie. `log.workspace = true`).

mod appender;
mod consts;
mod logger;

use appender::{AppenderSpec, CONSOLE_APPENDER, ERR_LOG_FILE_APPENDER, LOG_FILE_APPENDER};
use consts::{DEFAULT_LOGGER_ENV, ERR_LOG_FILE_NAME, LOG_FILE_NAME};
use log4rs::config::{Config, Root};
use logger::Builder;
use std::path::Path;
use thiserror::Error;

pub use log::{Level, LevelFilter};

#[derive(Clone, Debug, Error)]
pub enum LogError {
    #[error("Logger spec parsing error: {0}")]
    ParseLoggerSpecError(String),

    #[error("log path {0} is not valid UTF-8")]
    InvalidPath(String),

    #[error("appender {0} could not be built: {1}")]
    Appender(&'static str, String),

    #[error("log config error: {0}")]
    Config(String),
}

fn build_config(log_dir: Option<&Path>, filters: &str) -> Result<(Config, Builder), LogError> {
    let mut builder = Builder::new(LevelFilter::Info);
    builder.parse_env(DEFAULT_LOGGER_ENV).parse_expression(filters);

    let mut appenders = vec![AppenderSpec::console(CONSOLE_APPENDER, None)];
    if let Some(log_dir) = log_dir {
        appenders.push(AppenderSpec::roller(LOG_FILE_APPENDER, None, log_dir, LOG_FILE_NAME)?);
        appenders.push(AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(LevelFilter::Warn), log_dir, ERR_LOG_FILE_NAME)?);
    }
    let names = appenders.iter().map(|x| x.name).collect::<Vec<_>>();

    let config = Config::builder()
        .appenders(appenders.into_iter().map(AppenderSpec::into_appender))
        .loggers(builder.loggers())
        .build(Root::builder().appenders(names).build(builder.root_level()))
        .map_err(|err| LogError::Config(err.to_string()))?;
    Ok((config, builder))
}

/// Initializes the global logger with a console appender and, when `log_dir`
/// is provided, a rolling log file plus a warnings-and-above error file.
///
/// `filters` uses the `RUST_LOG` syntax and is applied on top of the environment.
pub fn init_logger(log_dir: Option<&Path>, filters: &str) -> Result<(), LogError> {
    let (config, builder) = build_config(log_dir, filters)?;
    log4rs::init_config(config).map_err(|err| LogError::Config(err.to_string()))?;
    for rejected in builder.rejected() {
        log::warn!("Ignoring invalid logging spec: {}", rejected);
    }
    Ok(())
}

/// Tries to init the global logger, but does not panic if it was already setup.
/// Should be used for tests.
pub fn try_init_logger(filters: &str) {
    if let Ok((config, _)) = build_config(None, filters) {
        let _ = log4rs::init_config(config);
    }
}

#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => (
        log::trace!($($t)*)
    )
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => (
        log::debug!($($t)*)
    )
}

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => (
        log::info!($($t)*)
    )
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => (
        log::warn!($($t)*)
    )
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => (
        log::error!($($t)*)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_appenders_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let (config, builder) = build_config(Some(dir.path()), "debug,blockdag_consensus=trace").unwrap();
        assert_eq!(config.appenders().len(), 3);
        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert_eq!(builder.max_level(), LevelFilter::Trace);
    }

    #[test]
    fn test_console_only() {
        let (config, _) = build_config(None, "").unwrap();
        assert_eq!(config.appenders().len(), 1);
        try_init_logger("info");
        crate::info!("logger initialized for {}", "tests");
    }
}
