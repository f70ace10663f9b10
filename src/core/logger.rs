//! Logger nodes and the threshold dispatch algorithm

use super::appender::AppenderRef;
use super::dispatch::{Command, DispatchHandle};
use super::log_level::LogLevel;
use super::log_message::LogMessage;
use super::registry::LoggerTable;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mutable configuration of a logger node. Written only by the dispatch
/// executor; read by `is_enabled` on arbitrary caller threads.
struct LoggerState {
    parent: Option<String>,
    level: LogLevel,
    enabled: bool,
    additivity: bool,
    /// Minimum-severity threshold -> appenders attached under it, in
    /// attach order. A message fires the union of all buckets at or below
    /// its severity.
    thresholds: BTreeMap<LogLevel, Vec<AppenderRef>>,
}

struct LoggerShared {
    name: String,
    state: RwLock<LoggerState>,
    dispatch: DispatchHandle,
}

/// A named node in the logger hierarchy.
///
/// `Logger` is a cheap-clone handle: every clone (and every
/// [`LoggerRegistry::get`](super::registry::LoggerRegistry::get) for the
/// same name) refers to the same canonical state. The parent link is a
/// name, resolved against the registry at dispatch time, never an owning
/// reference.
///
/// All mutators and [`log`](Logger::log) are fire-and-forget: they submit
/// a command to the dispatch executor and return immediately. Their effect
/// becomes visible once the executor has processed the command; commands
/// from one thread are processed in submission order.
///
/// A freshly created logger is maximally restrictive: level
/// [`LogLevel::Off`], no appenders, enabled, non-additive, no parent.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<LoggerShared>,
}

impl Logger {
    pub(crate) fn new(name: impl Into<String>, dispatch: DispatchHandle) -> Self {
        Self {
            shared: Arc::new(LoggerShared {
                name: name.into(),
                state: RwLock::new(LoggerState {
                    parent: None,
                    level: LogLevel::Off,
                    enabled: true,
                    additivity: false,
                    thresholds: BTreeMap::new(),
                }),
                dispatch,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Whether a message at `level` would currently be dispatched by this
    /// logger. Pure and synchronous; call sites use it to skip building a
    /// message nothing would consume.
    ///
    /// Reads the state as of the last executed mutation: a queued
    /// `add_appender` or `set_level` is not reflected until the worker has
    /// processed it.
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        let state = self.shared.state.read();
        state.enabled && level.is_at_least(state.level)
    }

    /// Effective severity threshold. Only ever moves toward more verbose:
    /// it is the running minimum of every level supplied to
    /// [`add_appender`](Logger::add_appender) or
    /// [`set_level`](Logger::set_level).
    pub fn level(&self) -> LogLevel {
        self.shared.state.read().level
    }

    pub fn enabled(&self) -> bool {
        self.shared.state.read().enabled
    }

    pub fn additivity(&self) -> bool {
        self.shared.state.read().additivity
    }

    /// Name of the parent logger, if one is set.
    pub fn parent(&self) -> Option<String> {
        self.shared.state.read().parent.clone()
    }

    /// Total number of attached appender entries across all thresholds.
    pub fn appender_count(&self) -> usize {
        self.shared
            .state
            .read()
            .thresholds
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Submit a message for dispatch, fire-and-forget.
    ///
    /// The enabled/level check runs on the executor, not here, so a `log`
    /// submitted after an `add_appender` from the same thread observes the
    /// attach even though neither has completed yet.
    pub fn log(&self, level: LogLevel, message: LogMessage) {
        self.shared.dispatch.submit(Command::Emit {
            logger: self.clone(),
            level,
            message,
        });
    }

    /// Attach `appender` under the minimum-severity threshold `level`,
    /// ratcheting the effective level down to `min(level, current)`.
    /// Fire-and-forget.
    pub fn add_appender(&self, level: LogLevel, appender: AppenderRef) {
        self.shared.dispatch.submit(Command::Attach {
            logger: self.clone(),
            level,
            appender,
        });
    }

    /// Lower the effective level to `level` if it is more verbose than the
    /// current one. Raising the level back up is not possible; the ratchet
    /// only loosens. Fire-and-forget.
    pub fn set_level(&self, level: LogLevel) {
        self.shared.dispatch.submit(Command::SetLevel {
            logger: self.clone(),
            level,
        });
    }

    /// Set or clear the parent link, by name. The chain is assumed acyclic;
    /// a cycle is not detected and makes an additive dispatch recurse
    /// without bound. Fire-and-forget.
    pub fn set_parent(&self, parent: Option<String>) {
        self.shared.dispatch.submit(Command::SetParent {
            logger: self.clone(),
            parent,
        });
    }

    /// Fire-and-forget; a disabled logger participates in no dispatch.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.dispatch.submit(Command::SetEnabled {
            logger: self.clone(),
            enabled,
        });
    }

    /// When additive, a dispatched message is also forwarded to the
    /// parent's dispatch logic with its original severity. Fire-and-forget.
    pub fn set_additivity(&self, additive: bool) {
        self.shared.dispatch.submit(Command::SetAdditivity {
            logger: self.clone(),
            additive,
        });
    }

    // ---- executor side ----------------------------------------------------

    pub(crate) fn apply_attach(&self, level: LogLevel, appender: AppenderRef) {
        let mut state = self.shared.state.write();
        if level < state.level {
            state.level = level;
        }
        state.thresholds.entry(level).or_default().push(appender);
    }

    pub(crate) fn apply_set_level(&self, level: LogLevel) {
        let mut state = self.shared.state.write();
        if level < state.level {
            state.level = level;
        }
    }

    pub(crate) fn apply_set_parent(&self, parent: Option<String>) {
        self.shared.state.write().parent = parent;
    }

    pub(crate) fn apply_set_enabled(&self, enabled: bool) {
        self.shared.state.write().enabled = enabled;
    }

    pub(crate) fn apply_set_additivity(&self, additive: bool) {
        self.shared.state.write().additivity = additive;
    }

    /// The dispatch algorithm. Runs on the executor.
    ///
    /// No-op unless `is_enabled(level)`. Otherwise every threshold bucket
    /// with key `<= level` fires, in descending key order, preserving each
    /// bucket's attach order. If the node is additive and its parent name
    /// resolves, the same logic repeats at the parent with the identical
    /// level and message; an unresolved parent silently ends propagation.
    ///
    /// Returns the number of `deliver` calls made. The state lock is
    /// released before any appender runs.
    pub(crate) fn dispatch(&self, level: LogLevel, message: &LogMessage, table: &LoggerTable) -> u64 {
        let (fire, parent) = {
            let state = self.shared.state.read();
            if !(state.enabled && level.is_at_least(state.level)) {
                return 0;
            }
            let fire: Vec<AppenderRef> = state
                .thresholds
                .range(..=level)
                .rev()
                .flat_map(|(_, bucket)| bucket.iter().cloned())
                .collect();
            let parent = if state.additivity {
                state.parent.clone()
            } else {
                None
            };
            (fire, parent)
        };

        let mut delivered = fire.len() as u64;
        for appender in &fire {
            appender.deliver(message);
        }

        if let Some(name) = parent {
            if let Some(parent) = table.lookup(&name) {
                delivered += parent.dispatch(level, message, table);
            }
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::LogSystem;
    use crate::core::Appender;
    use parking_lot::Mutex;

    struct CountingAppender {
        count: Mutex<u64>,
    }

    impl CountingAppender {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                count: Mutex::new(0),
            })
        }

        fn count(&self) -> u64 {
            *self.count.lock()
        }
    }

    impl Appender for CountingAppender {
        fn deliver(&self, _message: &LogMessage) {
            *self.count.lock() += 1;
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_fresh_logger_is_maximally_restrictive() {
        let system = LogSystem::synchronous();
        let logger = system.get("fresh");

        assert_eq!(logger.level(), LogLevel::Off);
        assert!(logger.enabled());
        assert!(!logger.additivity());
        assert_eq!(logger.appender_count(), 0);
        assert!(!logger.is_enabled(LogLevel::Error));
    }

    #[test]
    fn test_attach_ratchets_level_down() {
        let system = LogSystem::synchronous();
        let logger = system.get("ratchet");
        let sink = CountingAppender::new();

        logger.add_appender(LogLevel::Warn, sink.clone());
        assert_eq!(logger.level(), LogLevel::Warn);

        logger.add_appender(LogLevel::Debug, sink.clone());
        assert_eq!(logger.level(), LogLevel::Debug);

        // Attaching at a stricter level never raises the ratchet back up
        logger.add_appender(LogLevel::Error, sink);
        assert_eq!(logger.level(), LogLevel::Debug);
    }

    #[test]
    fn test_bucket_union_fires_once_per_entry() {
        let system = LogSystem::synchronous();
        let logger = system.get("buckets");
        let debug_sink = CountingAppender::new();
        let warn_sink = CountingAppender::new();

        logger.add_appender(LogLevel::Debug, debug_sink.clone());
        logger.add_appender(LogLevel::Warn, warn_sink.clone());

        logger.log(LogLevel::Error, LogMessage::new(LogLevel::Error, "boom"));

        assert_eq!(debug_sink.count(), 1);
        assert_eq!(warn_sink.count(), 1);

        logger.log(LogLevel::Info, LogMessage::new(LogLevel::Info, "note"));

        // Info clears the debug bucket but not the warn bucket
        assert_eq!(debug_sink.count(), 2);
        assert_eq!(warn_sink.count(), 1);
    }

    #[test]
    fn test_disabled_logger_dispatches_nothing() {
        let system = LogSystem::synchronous();
        let logger = system.get("disabled");
        let sink = CountingAppender::new();

        logger.add_appender(LogLevel::All, sink.clone());
        logger.set_enabled(false);
        logger.log(LogLevel::Error, LogMessage::new(LogLevel::Error, "boom"));

        assert_eq!(sink.count(), 0);
        assert!(!logger.is_enabled(LogLevel::Error));
    }

    #[test]
    fn test_unresolved_parent_stops_propagation() {
        let system = LogSystem::synchronous();
        let child = system.get("orphan");
        let sink = CountingAppender::new();

        child.add_appender(LogLevel::Debug, sink.clone());
        child.set_parent(Some("no_such_logger".to_string()));
        child.set_additivity(true);

        // Delivers locally, silently stops at the unresolved parent
        child.log(LogLevel::Info, LogMessage::new(LogLevel::Info, "hello"));
        assert_eq!(sink.count(), 1);
    }
}
