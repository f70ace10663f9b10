//! Severity levels and the single ordering used everywhere

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log message, totally ordered from most verbose to most
/// restrictive: `All < Debug < Info < Warn < Error < Off`.
///
/// `Off` is the maximum and matches nothing; a logger at `Off` delivers
/// nothing until an attach ratchets it down. Every threshold comparison in
/// the engine goes through this order (via `Ord` or [`LogLevel::is_at_least`]),
/// so there is exactly one source of truth for which direction "more severe"
/// sorts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    All = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    #[default]
    Off = 5,
}

impl LogLevel {
    /// True when a message at `self` clears the threshold `threshold`.
    ///
    /// This is the bucket-activation predicate: an appender attached under
    /// threshold `T` receives every message whose severity is `>= T`.
    #[inline]
    #[must_use]
    pub fn is_at_least(self, threshold: LogLevel) -> bool {
        self >= threshold
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::All => "ALL",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Off => "OFF",
        }
    }

    /// Default terminal color for this level, used by the console sink when
    /// the configuration carries no color table.
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::All => BrightBlack,
            LogLevel::Debug => Green,
            LogLevel::Info => Cyan,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Off => BrightBlack,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(LogLevel::All),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" => Ok(LogLevel::Off),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(LogLevel::All < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Off);
    }

    #[test]
    fn test_is_at_least() {
        assert!(LogLevel::Error.is_at_least(LogLevel::Warn));
        assert!(LogLevel::Warn.is_at_least(LogLevel::Warn));
        assert!(!LogLevel::Info.is_at_least(LogLevel::Warn));
        // Off is the maximum: nothing clears it except Off itself
        assert!(!LogLevel::Error.is_at_least(LogLevel::Off));
    }

    #[test]
    fn test_parse() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("off".parse::<LogLevel>().unwrap(), LogLevel::Off);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&LogLevel::Warn).unwrap();
        assert_eq!(json, "\"warn\"");
        let level: LogLevel = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(level, LogLevel::Debug);
    }
}
