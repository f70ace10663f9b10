//! File appender: buffered append-only text sink

use super::render_template;
use crate::core::{Appender, LogMessage, LoggerError, Result, TimestampFormat};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug)]
pub struct FileAppender {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    timestamp_format: TimestampFormat,
}

impl FileAppender {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation(format!("opening log file '{}'", path.display()), e)
            })?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            timestamp_format: TimestampFormat::default(),
        })
    }

    /// Build from factory arguments: `{ "filename": "..." }`.
    pub fn from_args(args: &serde_json::Value) -> Result<Self> {
        let filename = args
            .get("filename")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| LoggerError::config("file", "missing 'filename' argument"))?;
        Self::new(filename)
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Appender for FileAppender {
    fn deliver(&self, message: &LogMessage) {
        let timestamp = self.timestamp_format.format(&message.context.timestamp);
        let mut line = format!(
            "[{}] [{:5}] [{}] {}",
            timestamp,
            message.level.to_str(),
            message.context.thread_label(),
            render_template(message)
        );
        if let Some(tag) = &message.context.tag {
            line.push_str(&format!(" [{}]", tag));
        }
        line.push('\n');

        let mut writer = self.writer.lock();
        if let Err(e) = writer.write_all(line.as_bytes()) {
            eprintln!(
                "logtree: file appender '{}' write failed: {}",
                self.path.display(),
                e
            );
        }
    }

    fn flush(&self) {
        if let Err(e) = self.writer.lock().flush() {
            eprintln!(
                "logtree: file appender '{}' flush failed: {}",
                self.path.display(),
                e
            );
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        let _ = self.writer.lock().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_deliver_writes_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");

        let appender = FileAppender::new(&path).unwrap();
        let message = LogMessage::new(LogLevel::Warn, "disk at ${pct}%").with_arg("pct", 93);
        appender.deliver(&message);
        appender.flush();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[WARN "));
        assert!(content.contains("disk at 93%"));
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_from_args_requires_filename() {
        let err = FileAppender::from_args(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_drop_flushes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drop.log");

        {
            let appender = FileAppender::new(&path).unwrap();
            appender.deliver(&LogMessage::new(LogLevel::Info, "bye"));
        }

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("bye"));
    }
}
