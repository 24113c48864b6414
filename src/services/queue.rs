use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

/// Submitter side of the in-process FIFO of pending job ids.
///
/// Holds ids only; the registry owns the jobs themselves.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Uuid>,
    depth: Arc<AtomicUsize>,
}

/// Worker side of the queue. There is exactly one per queue.
pub struct JobReceiver {
    rx: mpsc::UnboundedReceiver<Uuid>,
    depth: Arc<AtomicUsize>,
}

impl JobQueue {
    pub fn new() -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        (
            Self {
                tx,
                depth: depth.clone(),
            },
            JobReceiver { rx, depth },
        )
    }

    /// Enqueue a job id. Never waits for the worker.
    pub fn enqueue(&self, job_id: Uuid) -> Result<(), QueueError> {
        // Count before sending so the worker never decrements below zero.
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        if self.tx.send(job_id).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::Closed);
        }
        metrics::gauge!("message_queue_depth").set(depth as f64);
        Ok(())
    }

    /// Get the current queue depth (pending jobs).
    pub fn queue_depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Whether the worker side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl JobReceiver {
    /// Wait for the next job id, in enqueue order.
    /// Returns `None` once every submitter handle is dropped and the queue is drained.
    pub async fn dequeue(&mut self) -> Option<Uuid> {
        let job_id = self.rx.recv().await?;
        let depth = self
            .depth
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        metrics::gauge!("message_queue_depth").set(depth as f64);
        Some(job_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Job queue is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[tokio::test]
    async fn test_fifo_order_with_duplicates() {
        let (queue, mut receiver) = JobQueue::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        queue.enqueue(a).unwrap();
        queue.enqueue(b).unwrap();
        queue.enqueue(a).unwrap();
        assert_eq!(queue.queue_depth(), 3);

        assert_eq!(receiver.dequeue().await, Some(a));
        assert_eq!(receiver.dequeue().await, Some(b));
        assert_eq!(receiver.dequeue().await, Some(a));
        assert_eq!(queue.queue_depth(), 0);
    }

    #[test]
    fn test_dequeue_suspends_until_enqueue() {
        let (queue, mut receiver) = JobQueue::new();
        let id = Uuid::new_v4();

        let mut next = task::spawn(receiver.dequeue());
        assert_pending!(next.poll());

        queue.enqueue(id).unwrap();
        assert!(next.is_woken());
        assert_ready_eq!(next.poll(), Some(id));
    }

    #[tokio::test]
    async fn test_enqueue_after_receiver_dropped_fails() {
        let (queue, receiver) = JobQueue::new();
        drop(receiver);

        assert!(queue.is_closed());
        assert!(matches!(
            queue.enqueue(Uuid::new_v4()),
            Err(QueueError::Closed)
        ));
        assert_eq!(queue.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_dequeue_ends_when_senders_dropped() {
        let (queue, mut receiver) = JobQueue::new();
        let id = Uuid::new_v4();
        queue.enqueue(id).unwrap();
        drop(queue);

        assert_eq!(receiver.dequeue().await, Some(id));
        assert_eq!(receiver.dequeue().await, None);
    }
}
