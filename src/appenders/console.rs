//! Console appender: renders to stdout or stderr with per-level colors

use super::render_template;
use crate::core::{Appender, LogLevel, LogMessage, LoggerError, Result, TimestampFormat};
use colored::{Color, Colorize};
use std::collections::BTreeMap;
use std::io::Write;

/// Which standard stream this appender writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

pub struct ConsoleAppender {
    stream: ConsoleStream,
    colors: BTreeMap<LogLevel, Color>,
    timestamp_format: TimestampFormat,
}

impl ConsoleAppender {
    /// Stderr with the default color table.
    pub fn new() -> Self {
        Self::with_stream(ConsoleStream::Stderr)
    }

    pub fn with_stream(stream: ConsoleStream) -> Self {
        Self {
            stream,
            colors: Self::default_colors(),
            timestamp_format: TimestampFormat::default(),
        }
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Build from factory arguments:
    /// `{ "stream": "std_error"|"std_out",
    ///    "level_colors": [{ "level": "...", "color": "..." }, ...] }`.
    ///
    /// The color table is opaque to the engine; entries with an
    /// unrecognized level or color name are skipped. An absent table keeps
    /// the defaults.
    pub fn from_args(args: &serde_json::Value) -> Result<Self> {
        let stream = match args.get("stream").and_then(serde_json::Value::as_str) {
            Some("std_out") | Some("stdout") => ConsoleStream::Stdout,
            Some("std_error") | Some("stderr") | None => ConsoleStream::Stderr,
            Some(other) => {
                return Err(LoggerError::config(
                    "console",
                    format!("unknown stream '{}'", other),
                ))
            }
        };

        let mut appender = Self::with_stream(stream);

        if let Some(entries) = args.get("level_colors").and_then(serde_json::Value::as_array) {
            let mut colors = BTreeMap::new();
            for entry in entries {
                let level = entry
                    .get("level")
                    .and_then(serde_json::Value::as_str)
                    .and_then(|s| s.parse::<LogLevel>().ok());
                let color = entry
                    .get("color")
                    .and_then(serde_json::Value::as_str)
                    .and_then(Self::parse_color);
                if let (Some(level), Some(color)) = (level, color) {
                    colors.insert(level, color);
                }
            }
            appender.colors = colors;
        }

        Ok(appender)
    }

    fn default_colors() -> BTreeMap<LogLevel, Color> {
        BTreeMap::from([
            (LogLevel::Debug, Color::Green),
            (LogLevel::Warn, Color::Yellow),
            (LogLevel::Error, Color::Red),
        ])
    }

    fn parse_color(name: &str) -> Option<Color> {
        // "brown" is the historical name for the dim yellow terminal color
        match name {
            "black" => Some(Color::Black),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "brown" | "yellow" => Some(Color::Yellow),
            "blue" => Some(Color::Blue),
            "magenta" => Some(Color::Magenta),
            "cyan" => Some(Color::Cyan),
            "white" => Some(Color::White),
            _ => None,
        }
    }

    fn format_line(&self, message: &LogMessage) -> String {
        let level_str = match self.colors.get(&message.level) {
            Some(color) => format!("{:5}", message.level.to_str())
                .color(*color)
                .to_string(),
            None => format!("{:5}", message.level.to_str()),
        };

        let timestamp = self.timestamp_format.format(&message.context.timestamp);
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            timestamp,
            level_str,
            message.context.thread_label(),
            render_template(message)
        );

        if let Some(tag) = &message.context.tag {
            line.push_str(&format!(" [{}]", tag));
        }

        line
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn deliver(&self, message: &LogMessage) {
        let line = self.format_line(message);
        match self.stream {
            ConsoleStream::Stdout => println!("{}", line),
            ConsoleStream::Stderr => eprintln!("{}", line),
        }
    }

    fn flush(&self) {
        let _ = match self.stream {
            ConsoleStream::Stdout => std::io::stdout().flush(),
            ConsoleStream::Stderr => std::io::stderr().flush(),
        };
    }

    fn name(&self) -> &str {
        "console"
    }
}
