//! Process-wide registries: loggers, appender instances, appender factories
//!
//! All three are guarded by lightweight locks because they are touched from
//! arbitrary caller threads; no lock is ever held across a `deliver` call.

use super::appender::AppenderRef;
use super::dispatch::DispatchHandle;
use super::error::Result;
use super::logger::Logger;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// The name-indexed logger table. Shared between the registry front and the
/// dispatch executor, which resolves parent names against it.
pub(crate) struct LoggerTable {
    map: RwLock<HashMap<String, Logger>>,
}

impl LoggerTable {
    pub(crate) fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get_or_create(&self, name: &str, dispatch: &DispatchHandle) -> Logger {
        if let Some(logger) = self.map.read().get(name) {
            return logger.clone();
        }
        // Take the write lock and re-check so concurrent first lookups of
        // the same name still yield a single canonical instance.
        let mut map = self.map.write();
        map.entry(name.to_string())
            .or_insert_with(|| Logger::new(name, dispatch.clone()))
            .clone()
    }

    /// Lookup without creating. Parent resolution uses this: a parent name
    /// that was never registered stops propagation instead of spawning a
    /// fresh node.
    pub(crate) fn lookup(&self, name: &str) -> Option<Logger> {
        self.map.read().get(name).cloned()
    }

    pub(crate) fn clear(&self) {
        self.map.write().clear();
    }
}

/// Lazily populating mapping from name to the canonical [`Logger`] for that
/// name.
pub struct LoggerRegistry {
    table: Arc<LoggerTable>,
    dispatch: DispatchHandle,
}

impl LoggerRegistry {
    pub(crate) fn new(table: Arc<LoggerTable>, dispatch: DispatchHandle) -> Self {
        Self { table, dispatch }
    }

    /// Return the canonical logger for `name`, creating a new, empty,
    /// maximally-restrictive one on first access. Safe under concurrent
    /// calls; all callers for one name see the same instance.
    pub fn get(&self, name: &str) -> Logger {
        self.table.get_or_create(name, &self.dispatch)
    }

    /// Lookup without creating.
    pub fn lookup(&self, name: &str) -> Option<Logger> {
        self.table.lookup(name)
    }

    /// Discard every logger instance. Subsequent `get` calls create fresh,
    /// empty loggers; old handles keep their (now orphaned) state alive
    /// only as long as someone still holds them.
    pub fn clear(&self) {
        self.table.clear();
    }
}

/// Mapping from a user-chosen name to a live appender instance.
pub struct AppenderRegistry {
    map: Mutex<HashMap<String, AppenderRef>>,
}

impl AppenderRegistry {
    pub(crate) fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    /// Register `appender` under `name`, replacing any previous entry. The
    /// replaced instance stays alive while loggers still reference it.
    pub fn put(&self, name: impl Into<String>, appender: AppenderRef) {
        self.map.lock().insert(name.into(), appender);
    }

    pub fn get(&self, name: &str) -> Option<AppenderRef> {
        self.map.lock().get(name).cloned()
    }

    pub fn clear(&self) {
        self.map.lock().clear();
    }

    /// Snapshot of all registered instances, for flushing.
    pub(crate) fn snapshot(&self) -> Vec<AppenderRef> {
        self.map.lock().values().cloned().collect()
    }
}

/// Constructor function for an appender kind. Receives the opaque `args`
/// value from the configuration entry.
pub type AppenderCtor = Arc<dyn Fn(&serde_json::Value) -> Result<AppenderRef> + Send + Sync>;

/// Mapping from a sink type discriminator (`"console"`, `"file"`, ...) to
/// its constructor. Plugins register here at runtime, independent of the
/// engine.
pub struct FactoryRegistry {
    map: RwLock<HashMap<String, AppenderCtor>>,
}

impl FactoryRegistry {
    pub(crate) fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Register a constructor for `kind`. Re-registering an existing kind
    /// replaces the constructor; last write wins.
    pub fn register<F>(&self, kind: impl Into<String>, ctor: F)
    where
        F: Fn(&serde_json::Value) -> Result<AppenderRef> + Send + Sync + 'static,
    {
        self.map.write().insert(kind.into(), Arc::new(ctor));
    }

    /// Instantiate an appender of `kind`. `Ok(None)` when no factory is
    /// registered for `kind` (the caller skips the entry); `Err` only when
    /// the constructor itself fails.
    pub fn create(&self, kind: &str, args: &serde_json::Value) -> Result<Option<AppenderRef>> {
        let ctor = self.map.read().get(kind).cloned();
        match ctor {
            Some(ctor) => ctor(args).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::LogSystem;
    use crate::core::error::LoggerError;
    use crate::core::log_level::LogLevel;
    use crate::core::log_message::LogMessage;
    use crate::core::Appender;

    struct NullAppender;

    impl Appender for NullAppender {
        fn deliver(&self, _message: &LogMessage) {}

        fn name(&self) -> &str {
            "null"
        }
    }

    #[test]
    fn test_logger_registry_canonical_instance() {
        let system = LogSystem::synchronous();
        let a = system.loggers().get("net.server");
        let b = system.loggers().get("net.server");

        // Mutations through one handle are visible through the other
        a.set_level(LogLevel::Debug);
        assert_eq!(b.level(), LogLevel::Debug);
    }

    #[test]
    fn test_logger_registry_clear_discards_state() {
        let system = LogSystem::synchronous();
        let before = system.loggers().get("transient");
        before.set_level(LogLevel::All);

        system.loggers().clear();
        let after = system.loggers().get("transient");

        assert_eq!(after.level(), LogLevel::Off);
        // The old handle kept its orphaned state
        assert_eq!(before.level(), LogLevel::All);
    }

    #[test]
    fn test_appender_registry_put_get_clear() {
        let registry = AppenderRegistry::new();
        assert!(registry.get("a").is_none());

        registry.put("a", Arc::new(NullAppender));
        assert!(registry.get("a").is_some());

        registry.clear();
        assert!(registry.get("a").is_none());
    }

    #[test]
    fn test_factory_unknown_kind_is_absent_not_error() {
        let factories = FactoryRegistry::new();
        let result = factories.create("gelf", &serde_json::Value::Null);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_factory_last_registration_wins() {
        let factories = FactoryRegistry::new();
        factories.register("null", |_args| {
            Err(LoggerError::other("first registration"))
        });
        factories.register("null", |_args| Ok(Arc::new(NullAppender) as AppenderRef));

        let created = factories.create("null", &serde_json::Value::Null);
        assert!(matches!(created, Ok(Some(_))));
    }

    #[test]
    fn test_factory_constructor_failure_propagates() {
        let factories = FactoryRegistry::new();
        factories.register("broken", |_args| {
            Err(LoggerError::config("broken", "always fails"))
        });

        assert!(factories.create("broken", &serde_json::Value::Null).is_err());
    }
}
