//! The logging system context and the process-wide default instance
//!
//! A [`LogSystem`] bundles the three registries and the dispatch executor.
//! Libraries that want isolation construct and inject their own; everyday
//! call sites go through the default global instance behind the free
//! functions at the crate root.

use super::appender::AppenderRef;
use super::dispatch::{self, Command, DispatchHandle, DispatchMetrics, DEFAULT_SHUTDOWN_TIMEOUT};
use super::error::Result;
use super::logger::Logger;
use super::registry::{AppenderRegistry, FactoryRegistry, LoggerRegistry, LoggerTable};
use crate::config::LoggingConfig;
use crossbeam_channel::bounded;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// An explicitly constructed logging engine: logger registry, appender
/// registry, appender factory registry, and the dispatch executor that
/// serializes all mutation and emission.
pub struct LogSystem {
    loggers: LoggerRegistry,
    appenders: AppenderRegistry,
    factories: FactoryRegistry,
    dispatch: DispatchHandle,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl LogSystem {
    /// Build a system with the asynchronous dispatch worker. This is the
    /// normal mode: every mutation and emission is queued and executed, in
    /// submission order, by one background thread.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Build a system without the worker: commands execute inline on the
    /// submitting thread. Appender `deliver` implementations must then
    /// tolerate concurrent callers.
    pub fn synchronous() -> Self {
        Self::build(false)
    }

    fn build(async_mode: bool) -> Self {
        let table = Arc::new(LoggerTable::new());
        let (dispatch, worker) = if async_mode {
            dispatch::start(&table)
        } else {
            dispatch::direct(&table)
        };

        let factories = FactoryRegistry::new();
        crate::appenders::register_builtin(&factories);

        Self {
            loggers: LoggerRegistry::new(table, dispatch.clone()),
            appenders: AppenderRegistry::new(),
            factories,
            dispatch,
            worker: Mutex::new(worker),
        }
    }

    /// Shorthand for `loggers().get(name)`.
    pub fn get(&self, name: &str) -> Logger {
        self.loggers.get(name)
    }

    pub fn loggers(&self) -> &LoggerRegistry {
        &self.loggers
    }

    pub fn appenders(&self) -> &AppenderRegistry {
        &self.appenders
    }

    pub fn factories(&self) -> &FactoryRegistry {
        &self.factories
    }

    /// Register a constructor for a sink type discriminator. Plugins call
    /// this at startup; re-registration replaces the previous constructor.
    pub fn register_factory<F>(&self, kind: impl Into<String>, ctor: F)
    where
        F: Fn(&serde_json::Value) -> Result<AppenderRef> + Send + Sync + 'static,
    {
        self.factories.register(kind, ctor);
    }

    /// Instantiate an appender of `kind` and register it under `name`.
    /// `Ok(None)` when no factory is registered for `kind`; nothing is
    /// created or registered in that case.
    pub fn create_appender(
        &self,
        name: &str,
        kind: &str,
        args: &serde_json::Value,
    ) -> Result<Option<AppenderRef>> {
        let created = self.factories.create(kind, args)?;
        if let Some(appender) = &created {
            self.appenders.put(name, Arc::clone(appender));
        }
        Ok(created)
    }

    pub fn appender(&self, name: &str) -> Option<AppenderRef> {
        self.appenders.get(name)
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        self.dispatch.metrics()
    }

    /// Drain the executor, then flush every registered appender.
    ///
    /// Returns once every command submitted before this call has executed,
    /// or `false` if the worker did not drain within
    /// [`DEFAULT_SHUTDOWN_TIMEOUT`]. In synchronous mode there is nothing
    /// to drain and only the appender flush runs.
    pub fn flush(&self) -> bool {
        let drained = if self.dispatch.is_async() && self.worker.lock().is_some() {
            let (ack_tx, ack_rx) = bounded(1);
            self.dispatch.submit(Command::Flush { ack: ack_tx });
            ack_rx.recv_timeout(DEFAULT_SHUTDOWN_TIMEOUT).is_ok()
        } else {
            true
        };

        for appender in self.appenders.snapshot() {
            appender.flush();
        }

        drained
    }

    /// Stop the dispatch worker after it has processed everything already
    /// queued, waiting up to `timeout` for it to finish.
    ///
    /// Returns `true` on a clean join (or when there is no worker). After
    /// shutdown, fire-and-forget submissions are silently dropped.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let Some(handle) = self.worker.lock().take() else {
            return true;
        };

        self.dispatch.submit(Command::Shutdown);

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                return handle.join().is_ok();
            }
            if start.elapsed() >= timeout {
                eprintln!(
                    "logtree: dispatch worker did not finish within {:?}; \
                     pending log messages may be lost",
                    timeout
                );
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Default for LogSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogSystem {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

/// The process-wide default system. Created on first touch with the
/// built-in default configuration applied; an explicit [`configure`] call
/// supersedes it.
static GLOBAL: Lazy<LogSystem> = Lazy::new(|| {
    let system = LogSystem::new();
    let _ = system.apply(&LoggingConfig::default_config());
    system
});

/// The default global [`LogSystem`].
pub fn global() -> &'static LogSystem {
    &GLOBAL
}

/// Canonical logger for `name` in the global system, created on first
/// access.
pub fn get(name: &str) -> Logger {
    GLOBAL.get(name)
}

/// Discard every logger in the global system.
pub fn clear_all() {
    GLOBAL.loggers().clear();
}

/// Named appender instance from the global system, if registered.
pub fn appender(name: &str) -> Option<AppenderRef> {
    GLOBAL.appender(name)
}

/// Create an appender of `kind` in the global system and register it under
/// `name`. `Ok(None)` when the kind has no registered factory.
pub fn create_appender(
    name: &str,
    kind: &str,
    args: &serde_json::Value,
) -> Result<Option<AppenderRef>> {
    GLOBAL.create_appender(name, kind, args)
}

/// Empty the global appender registry.
pub fn clear_appenders() {
    GLOBAL.appenders().clear();
}

/// Register a sink constructor in the global system.
pub fn register_factory<F>(kind: impl Into<String>, ctor: F)
where
    F: Fn(&serde_json::Value) -> Result<AppenderRef> + Send + Sync + 'static,
{
    GLOBAL.register_factory(kind, ctor);
}

/// Apply a configuration to the global system. See
/// [`LogSystem::apply`](crate::config) for the failure semantics.
pub fn configure(config: &LoggingConfig) -> bool {
    GLOBAL.apply(config)
}

/// Decode a JSON configuration document and apply it to the global system.
pub fn configure_file(path: impl AsRef<Path>) -> bool {
    GLOBAL.apply_file(path)
}

/// Drain the global dispatch worker and flush registered appenders.
pub fn flush() -> bool {
    GLOBAL.flush()
}

/// Shut down the global dispatch worker.
pub fn shutdown(timeout: Duration) -> bool {
    GLOBAL.shutdown(timeout)
}
