//! JSON appender: one JSON object per message (JSONL)
//!
//! Structured counterpart to [`FileAppender`](super::FileAppender);
//! compatible with log aggregation pipelines that ingest JSON lines.

use super::render_template;
use crate::core::{Appender, LogMessage, LoggerError, Result};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub struct JsonAppender {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonAppender {
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
        })
    }

    /// Build from factory arguments: `{ "filename": "..." }`.
    pub fn from_args(args: &serde_json::Value) -> Result<Self> {
        let filename = args
            .get("filename")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| LoggerError::config("json", "missing 'filename' argument"))?;
        Self::new(filename)
    }

    fn to_json(message: &LogMessage) -> Value {
        let mut object = Map::new();
        object.insert(
            "timestamp".to_string(),
            json!(message.context.timestamp.to_rfc3339()),
        );
        object.insert("level".to_string(), json!(message.level));
        object.insert("message".to_string(), json!(render_template(message)));

        if !message.args.is_empty() {
            let mut args = Map::new();
            for (name, value) in &message.args {
                args.entry(name.clone()).or_insert_with(|| value.to_json_value());
            }
            object.insert("args".to_string(), Value::Object(args));
        }

        object.insert(
            "thread".to_string(),
            json!(message.context.thread_label()),
        );
        if let (Some(file), Some(line)) = (&message.context.file, message.context.line) {
            object.insert("source".to_string(), json!(format!("{}:{}", file, line)));
        }
        if let Some(module_path) = &message.context.module_path {
            object.insert("module".to_string(), json!(module_path));
        }
        if let Some(tag) = &message.context.tag {
            object.insert("tag".to_string(), json!(tag));
        }

        Value::Object(object)
    }
}

impl Appender for JsonAppender {
    fn deliver(&self, message: &LogMessage) {
        let object = Self::to_json(message);
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{}", object) {
            eprintln!(
                "logtree: json appender '{}' write failed: {}",
                self.path.display(),
                e
            );
        }
    }

    fn flush(&self) {
        if let Err(e) = self.writer.lock().flush() {
            eprintln!(
                "logtree: json appender '{}' flush failed: {}",
                self.path.display(),
                e
            );
        }
    }

    fn name(&self) -> &str {
        "json"
    }
}

impl Drop for JsonAppender {
    fn drop(&mut self) {
        let _ = self.writer.lock().flush();
    }
}
