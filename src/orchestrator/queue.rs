//! OrchestrationQueue (C7): the single process-wide serialization point for
//! C4 invocations. A mutex-guarded slot rather than the teacher's `OnceLock`
//! global registry, since the spec calls for explicit init/teardown instead
//! of a process-lifetime singleton.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct CurrentRun {
    pub request_id: String,
    pub requested_by: String,
    pub cancel: CancellationToken,
}

#[derive(Default)]
pub struct OrchestrationQueue {
    current: Arc<Mutex<Option<CurrentRun>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    Queued,
    RejectedAlreadyRunning,
}

impl OrchestrationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to claim the single slot using the caller-supplied
    /// cancellation token, so a later `current_run().cancel.cancel()` call
    /// from another component reaches the same token the stages observe.
    /// Returns `RejectedAlreadyRunning` if a run is already current.
    pub async fn queue(
        &self,
        request_id: String,
        requested_by: String,
        cancel: CancellationToken,
    ) -> QueueOutcome {
        let mut guard = self.current.lock().await;
        if guard.is_some() {
            return QueueOutcome::RejectedAlreadyRunning;
        }
        *guard = Some(CurrentRun {
            request_id,
            requested_by,
            cancel,
        });
        QueueOutcome::Queued
    }

    /// Releases the slot; called once the run has completed or failed.
    pub async fn release(&self) {
        let mut guard = self.current.lock().await;
        *guard = None;
    }

    pub async fn current_run(&self) -> Option<CurrentRun> {
        self.current.lock().await.clone()
    }

    pub async fn is_running_in_memory(&self) -> bool {
        self.current.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_queue_attempt_is_rejected_while_one_is_running() {
        let queue = OrchestrationQueue::new();
        let first = queue
            .queue("req-1".into(), "scheduler".into(), CancellationToken::new())
            .await;
        assert_eq!(first, QueueOutcome::Queued);

        let second = queue
            .queue("req-2".into(), "scheduler".into(), CancellationToken::new())
            .await;
        assert_eq!(second, QueueOutcome::RejectedAlreadyRunning);

        queue.release().await;
        let third = queue
            .queue("req-3".into(), "scheduler".into(), CancellationToken::new())
            .await;
        assert_eq!(third, QueueOutcome::Queued);
    }

    #[tokio::test]
    async fn current_run_reflects_the_claimed_slot() {
        let queue = OrchestrationQueue::new();
        assert!(queue.current_run().await.is_none());
        queue
            .queue("req-1".into(), "scheduler".into(), CancellationToken::new())
            .await;
        let current = queue.current_run().await.unwrap();
        assert_eq!(current.request_id, "req-1");
    }
}
