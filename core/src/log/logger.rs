use super::LogError;
use log::LevelFilter;
use log4rs::config::Logger;
use std::{collections::BTreeMap, env};

/// Collects per-target levels from `RUST_LOG`-style expressions such as
/// `info,blockdag_consensus=trace,blockdag_database=warn`.
pub(super) struct Builder {
    loggers: BTreeMap<String, LevelFilter>,
    root_level: LevelFilter,
    rejected: Vec<LogError>,
}

impl Builder {
    pub fn new(root_level: LevelFilter) -> Builder {
        Builder { loggers: BTreeMap::new(), root_level, rejected: vec![] }
    }

    pub fn parse_env(&mut self, env: &str) -> &mut Self {
        self.parse_expression(&env::var(env).unwrap_or_default())
    }

    pub fn parse_expression(&mut self, expression: &str) -> &mut Self {
        for spec in expression.split(',').map(|x| x.trim()).filter(|x| !x.is_empty()) {
            let mut parts = spec.split('=');
            match (parts.next(), parts.next().map(|x| x.trim()), parts.next()) {
                // A lone level sets the root level, a lone name enables everything for that target
                (Some(part0), None, None) => match part0.parse() {
                    Ok(level) => self.root_level = level,
                    Err(_) => {
                        self.loggers.insert(part0.to_string(), LevelFilter::max());
                    }
                },
                (Some(part0), Some(""), None) => {
                    self.loggers.insert(part0.to_string(), LevelFilter::max());
                }
                (Some(part0), Some(part1), None) => match part1.parse() {
                    Ok(level) => {
                        self.loggers.insert(part0.to_string(), level);
                    }
                    Err(_) => self.rejected.push(LogError::ParseLoggerSpecError(part1.to_string())),
                },
                _ => self.rejected.push(LogError::ParseLoggerSpecError(spec.to_string())),
            }
        }
        self
    }

    pub fn root_level(&self) -> LevelFilter {
        self.root_level
    }

    /// Specs that could not be parsed and were ignored
    pub fn rejected(&self) -> &[LogError] {
        &self.rejected
    }

    pub fn loggers(&self) -> impl Iterator<Item = Logger> + '_ {
        self.loggers.iter().map(|(name, level)| Logger::builder().build(name.clone(), *level))
    }

    /// The most verbose level any target may log at
    pub fn max_level(&self) -> LevelFilter {
        self.loggers.values().copied().fold(self.root_level, std::cmp::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expression() {
        let mut builder = Builder::new(LevelFilter::Info);
        builder.parse_expression("warn, blockdag_consensus=trace ,blockdag_database=, bad=notalevel, a=b=c");

        assert_eq!(builder.root_level(), LevelFilter::Warn);
        assert_eq!(builder.loggers.get("blockdag_consensus"), Some(&LevelFilter::Trace));
        assert_eq!(builder.loggers.get("blockdag_database"), Some(&LevelFilter::Trace));
        assert_eq!(builder.rejected().len(), 2);
        assert_eq!(builder.max_level(), LevelFilter::Trace);
        assert_eq!(builder.loggers().count(), 2);
    }

    #[test]
    fn test_single_name_enables_target() {
        let mut builder = Builder::new(LevelFilter::Error);
        builder.parse_expression("blockdag_core");
        assert_eq!(builder.root_level(), LevelFilter::Error);
        assert_eq!(builder.loggers.get("blockdag_core"), Some(&LevelFilter::Trace));
    }
}
