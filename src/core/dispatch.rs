//! The single serializing dispatch worker
//!
//! Every logger mutation and every emission in the process is wrapped as a
//! [`Command`] and funneled through one executor. In asynchronous mode that
//! executor is a dedicated background thread fed by an unbounded channel;
//! submission never blocks and the intake order of the channel is the total
//! order of all logging activity. In direct synchronous mode commands run
//! inline on the submitting thread.

use super::appender::AppenderRef;
use super::log_level::LogLevel;
use super::log_message::LogMessage;
use super::logger::Logger;
use super::registry::LoggerTable;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

/// Default timeout for draining the worker during flush and shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A unit of work for the dispatch worker.
pub(crate) enum Command {
    Attach {
        logger: Logger,
        level: LogLevel,
        appender: AppenderRef,
    },
    SetLevel {
        logger: Logger,
        level: LogLevel,
    },
    SetParent {
        logger: Logger,
        parent: Option<String>,
    },
    SetEnabled {
        logger: Logger,
        enabled: bool,
    },
    SetAdditivity {
        logger: Logger,
        additive: bool,
    },
    Emit {
        logger: Logger,
        level: LogLevel,
        message: LogMessage,
    },
    /// Barrier: acknowledged once every previously submitted command has
    /// executed. Not part of the dispatch semantics proper; exists so tests
    /// and shutdown can drain deterministically.
    Flush {
        ack: Sender<()>,
    },
    Shutdown,
}

/// Counters for dispatch observability
///
/// `submitted` counts commands handed to the executor, `executed` counts
/// commands the executor has processed, `delivered` counts individual
/// appender deliveries. All counters are `Relaxed`; they are monitoring
/// data, not synchronization.
#[derive(Debug)]
pub struct DispatchMetrics {
    submitted: AtomicU64,
    executed: AtomicU64,
    delivered: AtomicU64,
}

impl DispatchMetrics {
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Total `deliver` calls made on appenders.
    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delivered(&self, count: u64) {
        self.delivered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.submitted.store(0, Ordering::Relaxed);
        self.executed.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap-clone submission side of the executor, embedded in every logger
/// handle.
///
/// Holds the logger table weakly: the table stores loggers, loggers store
/// this handle, and a strong reference here would cycle.
#[derive(Clone)]
pub(crate) struct DispatchHandle {
    sender: Option<Sender<Command>>,
    table: Weak<LoggerTable>,
    metrics: Arc<DispatchMetrics>,
}

impl DispatchHandle {
    /// Submit a command, fire-and-forget. In asynchronous mode this never
    /// blocks; a send after shutdown is silently dropped. In synchronous
    /// mode the command executes inline before returning.
    pub(crate) fn submit(&self, cmd: Command) {
        self.metrics.record_submitted();
        match &self.sender {
            Some(sender) => {
                let _ = sender.send(cmd);
            }
            None => {
                if let Some(table) = self.table.upgrade() {
                    execute(cmd, &table, &self.metrics);
                }
            }
        }
    }

    pub(crate) fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    pub(crate) fn is_async(&self) -> bool {
        self.sender.is_some()
    }
}

/// Start the background worker. Returns the submission handle and the
/// worker thread's join handle.
pub(crate) fn start(table: &Arc<LoggerTable>) -> (DispatchHandle, Option<thread::JoinHandle<()>>) {
    let (sender, receiver) = unbounded();
    let metrics = Arc::new(DispatchMetrics::new());
    let worker_table = Arc::clone(table);
    let worker_metrics = Arc::clone(&metrics);

    let handle = thread::spawn(move || run(receiver, worker_table, worker_metrics));

    (
        DispatchHandle {
            sender: Some(sender),
            table: Arc::downgrade(table),
            metrics,
        },
        Some(handle),
    )
}

/// Build a direct synchronous executor: no worker thread, every command
/// runs inline on the submitting thread.
pub(crate) fn direct(table: &Arc<LoggerTable>) -> (DispatchHandle, Option<thread::JoinHandle<()>>) {
    (
        DispatchHandle {
            sender: None,
            table: Arc::downgrade(table),
            metrics: Arc::new(DispatchMetrics::new()),
        },
        None,
    )
}

fn run(receiver: Receiver<Command>, table: Arc<LoggerTable>, metrics: Arc<DispatchMetrics>) {
    while let Ok(cmd) = receiver.recv() {
        if matches!(cmd, Command::Shutdown) {
            break;
        }
        execute(cmd, &table, &metrics);
    }
}

/// Execute one command. Runs on the worker thread in asynchronous mode, on
/// the submitting thread in synchronous mode.
fn execute(cmd: Command, table: &LoggerTable, metrics: &DispatchMetrics) {
    match cmd {
        Command::Attach {
            logger,
            level,
            appender,
        } => logger.apply_attach(level, appender),
        Command::SetLevel { logger, level } => logger.apply_set_level(level),
        Command::SetParent { logger, parent } => logger.apply_set_parent(parent),
        Command::SetEnabled { logger, enabled } => logger.apply_set_enabled(enabled),
        Command::SetAdditivity { logger, additive } => logger.apply_set_additivity(additive),
        Command::Emit {
            logger,
            level,
            message,
        } => {
            let delivered = logger.dispatch(level, &message, table);
            metrics.record_delivered(delivered);
        }
        Command::Flush { ack } => {
            let _ = ack.send(());
        }
        Command::Shutdown => {}
    }
    metrics.record_executed();
}
