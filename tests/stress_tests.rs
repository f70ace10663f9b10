//! Concurrency stress tests
//!
//! Many threads submit against one system; the worker gives a total order,
//! and each thread's own submissions stay in their submission order.

use logtree::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

#[derive(Default)]
struct CollectingAppender {
    messages: Mutex<Vec<String>>,
}

impl Appender for CollectingAppender {
    fn deliver(&self, message: &LogMessage) {
        self.messages.lock().push(message.format.clone());
    }

    fn name(&self) -> &str {
        "collector"
    }
}

#[test]
fn test_concurrent_submission_all_delivered_in_per_thread_order() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 100;

    let system = LogSystem::new();
    let logger = system.get("stress");
    let sink = Arc::new(CollectingAppender::default());

    // Submitted before any thread starts, so every emit observes it
    logger.add_appender(LogLevel::All, sink.clone());

    let handles: Vec<_> = (0..THREADS)
        .map(|thread_id| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.log(
                        LogLevel::Info,
                        LogMessage::new(LogLevel::Info, format!("t{}-{}", thread_id, i)),
                    );
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(system.flush());

    let messages = sink.messages.lock();
    assert_eq!(messages.len(), THREADS * PER_THREAD);

    // Per-thread subsequences arrive in submission order
    for thread_id in 0..THREADS {
        let prefix = format!("t{}-", thread_id);
        let sequence: Vec<usize> = messages
            .iter()
            .filter_map(|m| m.strip_prefix(&prefix))
            .map(|suffix| suffix.parse().unwrap())
            .collect();
        let expected: Vec<usize> = (0..PER_THREAD).collect();
        assert_eq!(sequence, expected, "thread {} out of order", thread_id);
    }
}

#[test]
fn test_concurrent_get_yields_single_canonical_instance() {
    const THREADS: usize = 8;

    let system = Arc::new(LogSystem::synchronous());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let system = Arc::clone(&system);
            thread::spawn(move || {
                let logger = system.get("shared");
                logger.add_appender(
                    LogLevel::Debug,
                    Arc::new(CollectingAppender::default()),
                );
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Every attach landed on the one canonical instance
    let logger = system.get("shared");
    assert_eq!(logger.appender_count(), THREADS);
    assert_eq!(logger.level(), LogLevel::Debug);
}

#[test]
fn test_concurrent_logging_during_reconfiguration() {
    let system = Arc::new(LogSystem::new());
    let sink = Arc::new(CollectingAppender::default());

    let logger = system.get("live");
    logger.add_appender(LogLevel::All, sink.clone());

    let writer = {
        let logger = logger.clone();
        thread::spawn(move || {
            for i in 0..200 {
                logger.log(
                    LogLevel::Info,
                    LogMessage::new(LogLevel::Info, format!("m{}", i)),
                );
            }
        })
    };

    // Registry churn on another thread must not disturb in-flight handles
    let churner = {
        let system = Arc::clone(&system);
        thread::spawn(move || {
            for i in 0..50 {
                let _ = system.get(&format!("churn.{}", i));
            }
            system.loggers().clear();
        })
    };

    writer.join().unwrap();
    churner.join().unwrap();
    assert!(system.flush());

    // Old handles stay valid; everything submitted was dispatched
    assert_eq!(sink.messages.lock().len(), 200);
}
