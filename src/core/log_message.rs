//! The immutable message value routed through the logger hierarchy
//!
//! A [`LogMessage`] is a format template plus an ordered list of named
//! arguments and a capture-time context block. The engine never renders the
//! template; rendering belongs to the sinks, which may substitute `${name}`
//! placeholders or emit the fields structurally.

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.is_none() {
            *cache = Some(format!("{:?}", std::thread::current().id()));
        }
        cache.as_ref().expect("cache filled above").clone()
    })
}

fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.is_none() {
            *cache = Some(std::thread::current().name().map(String::from));
        }
        cache.as_ref().expect("cache filled above").clone()
    })
}

/// Value type for named message arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl FieldValue {
    /// Convert to `serde_json::Value` for structured sinks
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Null => serde_json::Value::Null,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Capture-time context of a message: when, where, and on which thread it
/// originated. Filled once at construction and carried unchanged through
/// dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogContext {
    pub timestamp: DateTime<Utc>,
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
    /// Free-form tag a call site can attach (request id, subsystem, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl LogContext {
    pub fn capture() -> Self {
        Self {
            timestamp: Utc::now(),
            thread_id: current_thread_id(),
            thread_name: current_thread_name(),
            file: None,
            line: None,
            module_path: None,
            tag: None,
        }
    }

    /// Label for the originating thread: its name when it has one, its id
    /// otherwise.
    pub fn thread_label(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(&self.thread_id)
    }
}

/// An immutable log message: severity, format template, ordered named
/// arguments, and the capture-time [`LogContext`].
///
/// Argument order is insertion order; sinks that render the arguments see
/// them in the order the call site bound them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: LogLevel,
    pub format: String,
    pub args: Vec<(String, FieldValue)>,
    pub context: LogContext,
}

impl LogMessage {
    pub fn new(level: LogLevel, format: impl Into<String>) -> Self {
        Self {
            level,
            format: format.into(),
            args: Vec::new(),
            context: LogContext::capture(),
        }
    }

    /// Bind a named argument. Order is preserved; binding the same name
    /// twice keeps both entries.
    #[must_use]
    pub fn with_arg<V: Into<FieldValue>>(mut self, name: impl Into<String>, value: V) -> Self {
        self.args.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_location(mut self, file: &str, line: u32, module_path: &str) -> Self {
        self.context.file = Some(file.to_string());
        self.context.line = Some(line);
        self.context.module_path = Some(module_path.to_string());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.context.tag = Some(tag.into());
        self
    }

    /// Look up a bound argument by name (first binding wins).
    pub fn arg(&self, name: &str) -> Option<&FieldValue> {
        self.args.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_preserve_order() {
        let msg = LogMessage::new(LogLevel::Info, "a=${a} b=${b}")
            .with_arg("b", 2)
            .with_arg("a", 1);

        let names: Vec<&str> = msg.args.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_arg_lookup() {
        let msg = LogMessage::new(LogLevel::Debug, "${user}")
            .with_arg("user", "alice")
            .with_arg("attempt", 3);

        assert_eq!(msg.arg("user"), Some(&FieldValue::String("alice".into())));
        assert_eq!(msg.arg("attempt"), Some(&FieldValue::Int(3)));
        assert_eq!(msg.arg("missing"), None);
    }

    #[test]
    fn test_context_capture() {
        let msg = LogMessage::new(LogLevel::Warn, "low disk").with_location(
            "src/storage.rs",
            42,
            "app::storage",
        );

        assert_eq!(msg.context.file.as_deref(), Some("src/storage.rs"));
        assert_eq!(msg.context.line, Some(42));
        assert!(!msg.context.thread_id.is_empty());
    }

    #[test]
    fn test_field_value_json_bridge() {
        assert_eq!(
            FieldValue::Int(7).to_json_value(),
            serde_json::Value::from(7)
        );
        assert_eq!(FieldValue::Null.to_json_value(), serde_json::Value::Null);
        assert_eq!(
            FieldValue::Float(f64::NAN).to_json_value(),
            serde_json::Value::Null
        );
    }
}
