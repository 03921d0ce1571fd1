//! Task scheduling interface.
//!
//! The core enqueues named tasks with a JSON payload; execution order and
//! workers belong to the embedding application. Index and review tasks are
//! idempotent on `(repo, commit)` and `(repo, pr_id, head_sha)`, so
//! at-least-once delivery is safe.

use serde_json::Value;

/// Asynchronous task queue.
pub trait Scheduler: Send + Sync {
    fn enqueue(&self, task_name: &str, payload: Value);
}

/// In-process queue backed by an unbounded channel. The receiving half is
/// taken once by the worker loop.
pub struct QueueScheduler {
    tx: tokio::sync::mpsc::UnboundedSender<(String, Value)>,
}

impl QueueScheduler {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<(String, Value)>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Scheduler for QueueScheduler {
    fn enqueue(&self, task_name: &str, payload: Value) {
        // A closed receiver means shutdown; dropping the task is correct.
        let _ = self.tx.send((task_name.to_string(), payload));
    }
}

/// Sink that drops every task. For tooling that indexes inline.
#[derive(Debug, Default)]
pub struct NullScheduler;

impl Scheduler for NullScheduler {
    fn enqueue(&self, _task_name: &str, _payload: Value) {}
}
