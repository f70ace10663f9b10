//! Appender trait for pluggable message sinks

use super::log_message::LogMessage;
use std::sync::Arc;

/// Shared handle to a sink. One instance may be held by the appender
/// registry and any number of loggers at once; it lives as long as any of
/// them references it.
pub type AppenderRef = Arc<dyn Appender>;

/// A delivery target for log messages.
///
/// `deliver` has no return value: a sink handles its own failures (and
/// reports them to a diagnostic stream if it wants to), they never escape
/// into the dispatch path.
///
/// Under the asynchronous dispatch worker `deliver` is only ever invoked
/// from the single worker thread, so calls are strictly sequential. In
/// direct synchronous mode there is no such serialization and `deliver` may
/// be called concurrently from arbitrary threads; sinks own whatever
/// interior locking that requires.
pub trait Appender: Send + Sync {
    fn deliver(&self, message: &LogMessage);

    /// Push any buffered output to its destination. Default is a no-op for
    /// unbuffered sinks.
    fn flush(&self) {}

    fn name(&self) -> &str;
}
