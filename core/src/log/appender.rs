use super::{
    LogError,
    consts::{LOG_ARCHIVE_SUFFIX, LOG_FILE_BASE_ROLLS, LOG_FILE_MAX_ROLLS, LOG_FILE_MAX_SIZE, LOG_LINE_PATTERN, LOG_LINE_PATTERN_COLORED},
};
use log::LevelFilter;
use log4rs::{
    append::{
        Append,
        console::ConsoleAppender,
        rolling_file::{
            RollingFileAppender,
            policy::compound::{CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger},
        },
    },
    config::Appender,
    encode::pattern::PatternEncoder,
    filter::{Filter, threshold::ThresholdFilter},
};
use std::path::Path;

pub(super) const CONSOLE_APPENDER: &str = "stdout";
pub(super) const LOG_FILE_APPENDER: &str = "log_file";
pub(super) const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

/// A named log4rs appender together with an optional level threshold
pub(super) struct AppenderSpec {
    pub name: &'static str,
    level: Option<LevelFilter>,
    append: Box<dyn Append>,
}

impl AppenderSpec {
    pub fn console(name: &'static str, level: Option<LevelFilter>) -> Self {
        let encoder = Box::new(PatternEncoder::new(LOG_LINE_PATTERN_COLORED));
        Self { name, level, append: Box::new(ConsoleAppender::builder().encoder(encoder).build()) }
    }

    /// A size-triggered rolling file appender keeping gzip archives next to the live file
    pub fn roller(name: &'static str, level: Option<LevelFilter>, log_dir: &Path, file_name: &str) -> Result<Self, LogError> {
        let file_path = log_dir.join(file_name);
        let roller_pattern = log_dir.join(format!("{}{}", file_name, LOG_ARCHIVE_SUFFIX));
        let roller_pattern = roller_pattern.to_str().ok_or_else(|| LogError::InvalidPath(roller_pattern.display().to_string()))?;

        let roller = FixedWindowRoller::builder()
            .base(LOG_FILE_BASE_ROLLS)
            .build(roller_pattern, LOG_FILE_MAX_ROLLS)
            .map_err(|err| LogError::Appender(name, err.to_string()))?;
        let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(LOG_FILE_MAX_SIZE)), Box::new(roller));
        let file_appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
            .build(file_path, Box::new(policy))
            .map_err(|err| LogError::Appender(name, err.to_string()))?;

        Ok(Self { name, level, append: Box::new(file_appender) })
    }

    pub fn into_appender(self) -> Appender {
        Appender::builder().filters(self.level.map(|x| Box::new(ThresholdFilter::new(x)) as Box<dyn Filter>)).build(self.name, self.append)
    }
}
