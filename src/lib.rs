//! # logtree
//!
//! A hierarchical, pluggable logging engine: named loggers form a tree,
//! messages route through severity-keyed appender buckets, and all state
//! mutation and delivery is serialized by a single dispatch worker.
//!
//! ## Features
//!
//! - **Named logger hierarchy**: loggers are canonical per name, link to a
//!   parent by name, and optionally forward messages up the chain
//!   (additivity)
//! - **Threshold buckets**: appenders attach at a minimum severity; a
//!   message fires every bucket at or below its severity
//! - **Pluggable sinks**: console, file, and JSON appenders built in; new
//!   kinds register a factory at runtime
//! - **Single-worker dispatch**: fire-and-forget submission, one background
//!   thread, process-wide FIFO ordering
//! - **Configuration-driven wiring**: declarative JSON documents, tolerant
//!   of partially-invalid entries
//!
//! ## Quick start
//!
//! ```
//! use logtree::info;
//!
//! // The global system bootstraps itself with a console logger named
//! // "default" on first touch.
//! let logger = logtree::get("default");
//! info!(logger, "starting up on ${port}", port = 8080);
//! logtree::flush();
//! ```

pub mod appenders;
pub mod config;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, FileAppender, JsonAppender};
    pub use crate::config::{AppenderConfig, LoggerConfig, LoggingConfig};
    pub use crate::core::{
        Appender, AppenderRef, DispatchMetrics, FieldValue, LogContext, LogLevel, LogMessage,
        LogSystem, Logger, LoggerError, Result, TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

pub use appenders::{ConsoleAppender, FileAppender, JsonAppender};
pub use config::{AppenderConfig, LoggerConfig, LoggingConfig};
pub use core::context::{
    appender, clear_all, clear_appenders, configure, configure_file, create_appender, flush, get,
    global, register_factory, shutdown,
};
pub use core::{
    Appender, AppenderCtor, AppenderRef, AppenderRegistry, DispatchMetrics, FactoryRegistry,
    FieldValue, LogContext, LogLevel, LogMessage, LogSystem, Logger, LoggerError, LoggerRegistry,
    Result, TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
};
