//! Call-site macros
//!
//! Thin convenience layer over [`Logger::log`](crate::Logger::log): each
//! macro checks `is_enabled` first so the message value is never built when
//! nothing would consume it, then stamps the source location.
//!
//! The format string is a `${name}` template; arguments are bound by name
//! and substituted by sinks that render text, while structured sinks emit
//! them as fields.
//!
//! # Examples
//!
//! ```
//! use logtree::{info, warn};
//!
//! let logger = logtree::get("app");
//! info!(logger, "server listening on ${port}", port = 8080);
//! warn!(logger, "retry ${attempt} of ${max}", attempt = 3, max = 5);
//! ```

/// Log through `logger` at an explicit level.
///
/// ```
/// # let logger = logtree::get("doc");
/// use logtree::{log, LogLevel};
/// log!(logger, LogLevel::Info, "loaded ${count} items", count = 10);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $fmt:expr $(, $name:ident = $value:expr)* $(,)?) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            let message = $crate::LogMessage::new(level, $fmt)
                $(.with_arg(stringify!($name), $value))*
                .with_location(file!(), line!(), module_path!());
            logger.log(level, message);
        }
    }};
}

/// Log a debug-level message through `logger`.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($rest)+)
    };
}

/// Log an info-level message through `logger`.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($rest)+)
    };
}

/// Log a warn-level message through `logger`.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($rest)+)
    };
}

/// Log an error-level message through `logger`.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($rest)+)
    };
}

/// Log a debug-level message through the global `default` logger.
#[macro_export]
macro_rules! dlog {
    ($($rest:tt)+) => {
        $crate::log!($crate::get("default"), $crate::LogLevel::Debug, $($rest)+)
    };
}

/// Log an info-level message through the global `default` logger.
#[macro_export]
macro_rules! ilog {
    ($($rest:tt)+) => {
        $crate::log!($crate::get("default"), $crate::LogLevel::Info, $($rest)+)
    };
}

/// Log a warn-level message through the global `default` logger.
#[macro_export]
macro_rules! wlog {
    ($($rest:tt)+) => {
        $crate::log!($crate::get("default"), $crate::LogLevel::Warn, $($rest)+)
    };
}

/// Log an error-level message through the global `default` logger.
#[macro_export]
macro_rules! elog {
    ($($rest:tt)+) => {
        $crate::log!($crate::get("default"), $crate::LogLevel::Error, $($rest)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Appender, LogLevel, LogMessage, LogSystem};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct CapturingAppender {
        messages: Mutex<Vec<LogMessage>>,
    }

    impl Appender for CapturingAppender {
        fn deliver(&self, message: &LogMessage) {
            self.messages.lock().push(message.clone());
        }

        fn name(&self) -> &str {
            "capturing"
        }
    }

    #[test]
    fn test_log_macro_binds_args_and_location() {
        let system = LogSystem::synchronous();
        let logger = system.get("macros");
        let sink = Arc::new(CapturingAppender::default());
        logger.add_appender(LogLevel::All, sink.clone());

        info!(logger, "user ${user} logged in", user = "alice");

        let messages = sink.messages.lock();
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.level, LogLevel::Info);
        assert_eq!(message.format, "user ${user} logged in");
        assert_eq!(message.arg("user").unwrap().to_string(), "alice");
        assert_eq!(message.context.file.as_deref(), Some(file!()));
        assert!(message.context.module_path.as_deref().unwrap().contains("macros"));
    }

    #[test]
    fn test_macro_skips_disabled_levels() {
        let system = LogSystem::synchronous();
        let logger = system.get("macros_disabled");
        let sink = Arc::new(CapturingAppender::default());
        logger.add_appender(LogLevel::Warn, sink.clone());

        debug!(logger, "invisible");
        error!(logger, "visible");

        let messages = sink.messages.lock();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, LogLevel::Error);
    }

    #[test]
    fn test_level_shorthands() {
        let system = LogSystem::synchronous();
        let logger = system.get("macros_levels");
        let sink = Arc::new(CapturingAppender::default());
        logger.add_appender(LogLevel::All, sink.clone());

        debug!(logger, "d");
        info!(logger, "i");
        warn!(logger, "w");
        error!(logger, "e");

        let levels: Vec<LogLevel> = sink.messages.lock().iter().map(|m| m.level).collect();
        assert_eq!(
            levels,
            vec![
                LogLevel::Debug,
                LogLevel::Info,
                LogLevel::Warn,
                LogLevel::Error
            ]
        );
    }
}
