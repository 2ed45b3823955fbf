//! Bounded in-process queue with cancellable waits on both ends.
//!
//! Closing stops producers at once; consumers drain what is left and then
//! see [`QueueError::Closed`].

use tokio::sync::{Mutex, mpsc};

use crate::cancel::CancelToken;

/// Why a queue operation did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueueError {
    Canceled,
    Closed,
}

/// Multi-producer queue whose single receiver is shared behind a lock, so
/// any task holding a reference can wait on it.
#[derive(Debug)]
pub(crate) struct Queue<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
    closed: CancelToken,
}

impl<T: Send> Queue<T> {
    /// A queue holding at most `capacity` items; zero is raised to one.
    pub(crate) fn bounded(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(rx),
            closed: CancelToken::new(),
        }
    }

    /// Refuse further pushes. Queued items stay available to `pop`.
    pub(crate) fn close(&self) {
        self.closed.cancel();
    }

    /// Enqueue `item`, waiting while the queue is full.
    pub(crate) async fn push(&self, item: T, cancel: &CancelToken) -> Result<(), QueueError> {
        tokio::select! {
            biased;
            () = cancel.canceled() => Err(QueueError::Canceled),
            () = self.closed.canceled() => Err(QueueError::Closed),
            sent = self.tx.send(item) => sent.map_err(|_closed| QueueError::Closed),
        }
    }

    /// Enqueue `item` without a cancellation signal.
    pub(crate) async fn push_uncancellable(&self, item: T) -> Result<(), QueueError> {
        tokio::select! {
            biased;
            () = self.closed.canceled() => Err(QueueError::Closed),
            sent = self.tx.send(item) => sent.map_err(|_closed| QueueError::Closed),
        }
    }

    /// Dequeue the next item, waiting while the queue is empty and open.
    pub(crate) async fn pop(&self, cancel: &CancelToken) -> Result<T, QueueError> {
        let mut rx = tokio::select! {
            biased;
            () = cancel.canceled() => return Err(QueueError::Canceled),
            guard = self.rx.lock() => guard,
        };
        tokio::select! {
            biased;
            () = cancel.canceled() => Err(QueueError::Canceled),
            item = rx.recv() => item.ok_or(QueueError::Closed),
            () = self.closed.canceled() => rx.try_recv().map_err(|_empty| QueueError::Closed),
        }
    }

    /// Number of items waiting.
    pub(crate) fn len(&self) -> usize {
        self.tx.max_capacity().saturating_sub(self.tx.capacity())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn fifo_order() {
        let queue = Queue::bounded(4);
        let cancel = CancelToken::new();
        for n in 0..3 {
            queue.push(n, &cancel).await.unwrap();
        }
        assert_eq!(queue.len(), 3);
        for n in 0..3 {
            assert_eq!(queue.pop(&cancel).await.unwrap(), n);
        }
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn pop_on_empty_queue_is_cancellable() {
        let queue = Arc::new(Queue::<u8>::bounded(1));
        let cancel = CancelToken::new();
        let waiter = {
            let queue = Arc::clone(&queue);
            let cancel = cancel.clone();
            tokio::spawn(async move { queue.pop(&cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        cancel.cancel();
        assert_eq!(waiter.await.unwrap(), Err(QueueError::Canceled));
    }

    #[tokio::test]
    async fn push_on_full_queue_is_cancellable() {
        let queue = Queue::bounded(1);
        let cancel = CancelToken::new();
        queue.push(1_u8, &cancel).await.unwrap();
        cancel.cancel();
        assert_eq!(queue.push(2, &cancel).await, Err(QueueError::Canceled));
    }

    #[tokio::test]
    async fn closed_queue_drains_then_reports_closed() {
        let queue = Queue::bounded(4);
        let cancel = CancelToken::new();
        queue.push(1_u8, &cancel).await.unwrap();
        queue.push(2, &cancel).await.unwrap();
        queue.close();

        assert_eq!(queue.push(3, &cancel).await, Err(QueueError::Closed));
        assert_eq!(queue.push_uncancellable(3).await, Err(QueueError::Closed));
        assert_eq!(queue.pop(&cancel).await.unwrap(), 1);
        assert_eq!(queue.pop(&cancel).await.unwrap(), 2);
        assert_eq!(queue.pop(&cancel).await, Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn close_wakes_a_waiting_consumer() {
        let queue = Arc::new(Queue::<u8>::bounded(1));
        let cancel = CancelToken::new();
        let waiter = {
            let queue = Arc::clone(&queue);
            let cancel = cancel.clone();
            tokio::spawn(async move { queue.pop(&cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        queue.close();
        assert_eq!(waiter.await.unwrap(), Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn zero_capacity_holds_one_item() {
        let queue = Queue::bounded(0);
        queue.push_uncancellable(7_u8).await.unwrap();
        assert_eq!(queue.pop(&CancelToken::new()).await.unwrap(), 7);
    }
}
