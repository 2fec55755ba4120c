//! Declarative tree configuration.
//!
//! A [`TreeConfig`] describes settings for any number of loggers by dotted
//! name. Every field is optional: anything left out keeps its current value.
//! Reading the description from a file is up to the caller.
//!
//! ```json
//! {
//!   "autolog": false,
//!   "loggers": {
//!     "": { "level": "warning", "stream": "stderr" },
//!     "app.db": { "level": "debug", "file": "db.log", "record_format": "%t [%L] %n: %m" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LogResult;
use crate::format::RecordFormatter;
use crate::level::Severity;
use crate::sink::SinkSelector;
use crate::tree::{Logger, Registry};

/// Settings for one logger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub level: Option<Severity>,
    pub stream: Option<SinkSelector>,
    /// Log file path; an empty path closes the current file
    pub file: Option<PathBuf>,
    pub propagate: Option<bool>,
    pub record_format: Option<String>,
    pub time_format: Option<String>,
    pub trailing_newline: Option<bool>,
}

impl LoggerConfig {
    /// Whether the logger needs a formatter of its own.
    pub fn sets_format(&self) -> bool {
        self.record_format.is_some() || self.time_format.is_some() || self.trailing_newline.is_some()
    }

    /// A new formatter: configured fields, the rest copied from `base`.
    fn build_formatter(&self, base: &RecordFormatter) -> RecordFormatter {
        RecordFormatter::new(
            self.record_format
                .clone()
                .unwrap_or_else(|| base.record_format()),
            self.time_format.clone().unwrap_or_else(|| base.time_format()),
            self.trailing_newline.unwrap_or_else(|| base.trailing_newline()),
        )
    }

    /// Apply to `logger` without any record being emitted half-way.
    ///
    /// The log file is opened first; if that fails nothing else is changed.
    /// The default formatter is never modified: format fields give the
    /// logger a formatter of its own.
    pub fn apply_to(&self, logger: &Logger) -> LogResult<()> {
        logger.configure(|logger| {
            if let Some(path) = &self.file {
                logger.set_logfile(path)?;
            }
            if let Some(level) = self.level {
                logger.set_level(level);
            }
            if let Some(propagate) = self.propagate {
                logger.set_propagation(propagate);
            }
            if let Some(stream) = self.stream {
                logger.set_stream(stream);
            }
            if self.sets_format() {
                let formatter = self.build_formatter(&logger.formatter());
                logger.set_formatter(Arc::new(formatter));
            }
            Ok(())
        })
    }
}

/// Settings for a whole tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    pub autolog: Option<bool>,
    /// Dotted name -> settings; `""` is the root
    pub loggers: BTreeMap<String, LoggerConfig>,
}

impl Registry {
    /// Apply `config`, returning handles to every configured logger.
    ///
    /// Loggers only live while a handle exists, so the caller must keep the
    /// returned handles for the settings to stay in effect.
    ///
    /// Loggers are configured in name order and the first failure stops the
    /// run. The handles gathered so far are dropped with the error, so earlier
    /// loggers keep their new settings only if the caller holds other handles
    /// to them.
    pub fn apply(&self, config: &TreeConfig) -> LogResult<Vec<Logger>> {
        if let Some(autolog) = config.autolog {
            self.set_autolog(autolog);
        }

        let mut handles = Vec::with_capacity(config.loggers.len());
        for (name, logger_config) in &config.loggers {
            let logger = self.try_get(name)?;
            logger_config.apply_to(&logger)?;
            tracing::debug!(logger = %name, "applied logger configuration");
            handles.push(logger);
        }
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::StreamKind;
    use tempfile::TempDir;

    #[test]
    fn test_parse_tree_config() {
        let json = r#"{
            "autolog": true,
            "loggers": {
                "": { "level": "error", "stream": "stdout" },
                "app.db": { "level": "debug", "propagate": false, "record_format": "%L %m" }
            }
        }"#;
        let config: TreeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.autolog, Some(true));
        assert_eq!(config.loggers[""].stream, Some(SinkSelector::Stdout));
        assert_eq!(config.loggers["app.db"].level, Some(Severity::Debug));
        assert!(config.loggers["app.db"].sets_format());
        assert!(!config.loggers[""].sets_format());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{ "loggers": { "x": { "colour": "red" } } }"#;
        assert!(serde_json::from_str::<TreeConfig>(json).is_err());
    }

    #[test]
    fn test_apply_sets_fields_and_keeps_default_formatter() {
        let registry = Registry::new();
        let mut loggers = BTreeMap::new();
        loggers.insert(
            "svc".to_string(),
            LoggerConfig {
                level: Some(Severity::Info),
                stream: Some(SinkSelector::Stderr),
                propagate: Some(false),
                record_format: Some("[%L] %m".to_string()),
                ..Default::default()
            },
        );
        let config = TreeConfig {
            autolog: None,
            loggers,
        };

        let handles = registry.apply(&config).unwrap();
        assert_eq!(handles.len(), 1);
        let svc = &handles[0];
        assert_eq!(svc.level(), Severity::Info);
        assert_eq!(svc.stream(), Some(StreamKind::Stderr));
        assert!(!svc.propagates());
        assert!(svc.has_own_formatter());
        assert_eq!(svc.formatter().record_format(), "[%L] %m");
        assert_eq!(
            svc.formatter().time_format(),
            crate::format::DEFAULT_TIME_FORMAT
        );
        assert_eq!(
            registry.default_formatter().record_format(),
            crate::format::DEFAULT_RECORD_FORMAT
        );
    }

    #[test]
    fn test_apply_keeps_nodes_alive_only_through_handles() {
        let registry = Registry::new();
        let mut config = TreeConfig::default();
        config.loggers.insert(
            "a.b".to_string(),
            LoggerConfig {
                level: Some(Severity::Error),
                ..Default::default()
            },
        );

        let handles = registry.apply(&config).unwrap();
        assert!(registry.is_live("a.b"));
        drop(handles);
        assert!(!registry.is_live("a.b"));
        assert!(!registry.is_live("a"));
    }

    #[test]
    fn test_failed_logfile_leaves_other_settings_untouched() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::new();
        let svc = registry.try_get("svc").unwrap();

        let config = LoggerConfig {
            level: Some(Severity::Debug),
            stream: Some(SinkSelector::Stdout),
            propagate: Some(false),
            record_format: Some("%m".to_string()),
            file: Some(temp.path().join("missing").join("svc.log")),
            ..Default::default()
        };

        assert!(config.apply_to(&svc).is_err());
        assert_eq!(svc.level(), Severity::Unset);
        assert_eq!(svc.stream(), None);
        assert!(svc.propagates());
        assert!(!svc.has_own_formatter());
        assert_eq!(svc.logfile(), None);
    }

    #[test]
    fn test_apply_stops_at_first_failing_logger() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::new();
        let mut config = TreeConfig::default();
        config.loggers.insert(
            "a".to_string(),
            LoggerConfig {
                level: Some(Severity::Error),
                ..Default::default()
            },
        );
        config.loggers.insert(
            "b".to_string(),
            LoggerConfig {
                level: Some(Severity::Debug),
                file: Some(temp.path().join("missing").join("b.log")),
                ..Default::default()
            },
        );

        let kept = registry.try_get("a").unwrap();
        assert!(registry.apply(&config).is_err());
        assert_eq!(kept.level(), Severity::Error);
        assert!(!registry.is_live("b"));
    }
}
