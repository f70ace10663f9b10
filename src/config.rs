//! Declarative configuration: pure data plus the loader/applier
//!
//! A [`LoggingConfig`] names the appenders to instantiate and the loggers
//! to wire. Applying one is deliberately tolerant: unknown sink types and
//! dangling appender references degrade to fewer wired sinks instead of
//! failing, and an unexpected error aborts the remaining steps without
//! rolling back the ones already applied.

use crate::core::context::LogSystem;
use crate::core::error::{LoggerError, Result};
use crate::core::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::Path;

fn default_true() -> bool {
    true
}

/// One appender to instantiate: a user-chosen name, a sink type
/// discriminator, and an opaque argument value handed to the factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppenderConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl AppenderConfig {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            args,
        }
    }
}

/// One logger to wire. `level` is optional; an entry without it is
/// intentionally deferred and skipped by the applier. `enabled` defaults to
/// true, `additivity` to false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub additivity: bool,
    #[serde(default)]
    pub appenders: Vec<String>,
}

impl LoggerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            level: None,
            enabled: true,
            additivity: false,
            appenders: Vec::new(),
        }
    }
}

/// A full configuration value. Pure data; applying it is the
/// [`LogSystem::apply`] operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub appenders: Vec<AppenderConfig>,
    #[serde(default)]
    pub loggers: Vec<LoggerConfig>,
}

impl LoggingConfig {
    /// The built-in bootstrap configuration: console appenders `stderr`
    /// and `stdout` carrying the default color table, and one logger
    /// `default` attached to `stderr` at `info`.
    pub fn default_config() -> Self {
        let level_colors = json!([
            { "level": "debug", "color": "green" },
            { "level": "warn",  "color": "brown" },
            { "level": "error", "color": "red" },
        ]);

        Self {
            appenders: vec![
                AppenderConfig::new(
                    "stderr",
                    "console",
                    json!({ "stream": "std_error", "level_colors": level_colors }),
                ),
                AppenderConfig::new(
                    "stdout",
                    "console",
                    json!({ "stream": "std_out", "level_colors": level_colors }),
                ),
            ],
            loggers: vec![LoggerConfig {
                level: Some(LogLevel::Info),
                appenders: vec!["stderr".to_string()],
                ..LoggerConfig::new("default")
            }],
        }
    }

    /// Decode a configuration from a JSON document on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| LoggerError::config_file(path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&text)
            .map_err(|e| LoggerError::config_file(path.display().to_string(), e.to_string()))
    }
}

impl LogSystem {
    /// Apply a configuration: clear both registries, instantiate the
    /// configured appenders, then wire the configured loggers.
    ///
    /// Unknown sink types and appender names missing from the registry are
    /// skipped silently. Any unexpected error aborts the remaining steps,
    /// is reported to stderr, and makes `apply` return `false`; steps that
    /// already ran stay in effect. There is no rollback.
    pub fn apply(&self, config: &LoggingConfig) -> bool {
        match self.try_apply(config) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("logtree: failed to apply configuration: {}", e);
                false
            }
        }
    }

    /// Decode a JSON configuration document and apply it. Decode failures
    /// are reported the same way as apply failures.
    pub fn apply_file(&self, path: impl AsRef<Path>) -> bool {
        match LoggingConfig::from_file(path) {
            Ok(config) => self.apply(&config),
            Err(e) => {
                eprintln!("logtree: failed to apply configuration: {}", e);
                false
            }
        }
    }

    fn try_apply(&self, config: &LoggingConfig) -> Result<()> {
        self.loggers().clear();
        self.appenders().clear();

        for entry in &config.appenders {
            // Unknown kind -> Ok(None), skipped; only a failing
            // constructor aborts the apply.
            self.create_appender(&entry.name, &entry.kind, &entry.args)?;
        }

        for entry in &config.loggers {
            let Some(level) = entry.level else {
                continue;
            };

            let logger = self.loggers().get(&entry.name);
            logger.set_level(level);
            logger.set_parent(entry.parent.clone());
            logger.set_enabled(entry.enabled);
            logger.set_additivity(entry.additivity);

            for appender_name in &entry.appenders {
                if let Some(appender) = self.appenders().get(appender_name) {
                    logger.add_appender(level, appender);
                }
            }
        }

        Ok(())
    }
}
