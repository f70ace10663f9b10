//! Core engine types: severity, messages, loggers, registries, dispatch

pub mod appender;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod log_level;
pub mod log_message;
pub mod logger;
pub mod registry;
pub mod timestamp;

pub use appender::{Appender, AppenderRef};
pub use context::LogSystem;
pub use dispatch::{DispatchMetrics, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{LoggerError, Result};
pub use log_level::LogLevel;
pub use log_message::{FieldValue, LogContext, LogMessage};
pub use logger::Logger;
pub use registry::{AppenderCtor, AppenderRegistry, FactoryRegistry, LoggerRegistry};
pub use timestamp::TimestampFormat;
