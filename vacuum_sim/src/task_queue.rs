//! Thread-safe FIFO queue of simulation tasks.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A synchronized FIFO queue that workers drain until it is closed.
pub struct TaskQueue<T> {
    inner: Mutex<QueueState<T>>,
    available: Condvar,
}

struct QueueState<T> {
    queue: VecDeque<T>,
    closed: bool,
}

impl<T> TaskQueue<T> {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueState {
                queue: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Pushes a task; hands it back if the queue is closed.
    pub fn push(&self, task: T) -> Result<(), T> {
        let mut guard = self.lock();
        if guard.closed {
            return Err(task);
        }
        guard.queue.push_back(task);
        self.available.notify_one();
        Ok(())
    }

    /// Pops without blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().queue.pop_front()
    }

    /// Blocks until a task is available, or returns `None` once the queue
    /// is closed and drained.
    pub fn pop_blocking_or_closed(&self) -> Option<T> {
        let mut guard = self.lock();
        loop {
            if let Some(task) = guard.queue.pop_front() {
                return Some(task);
            }
            if guard.closed {
                return None;
            }
            guard = self
                .available
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Closes the queue and wakes every blocked consumer.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_tasks_are_consumed_once() {
        let queue = Arc::new(TaskQueue::new());
        for id in 0..100u64 {
            queue.push(id).unwrap();
        }
        queue.close();

        let consumers = 4;
        let barrier = Arc::new(Barrier::new(consumers));
        let seen = Arc::new(Mutex::new(HashSet::new()));

        let handles: Vec<_> = (0..consumers)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let barrier = Arc::clone(&barrier);
                let seen = Arc::clone(&seen);
                thread::spawn(move || {
                    barrier.wait();
                    while let Some(id) = queue.pop_blocking_or_closed() {
                        assert!(seen.lock().unwrap().insert(id));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(seen.lock().unwrap().len(), 100);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_blocking_wakes_on_push() {
        let queue = Arc::new(TaskQueue::new());
        let (ready_tx, ready_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let consumer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            ready_tx.send(()).unwrap();
            done_tx.send(consumer.pop_blocking_or_closed()).unwrap();
        });

        ready_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        queue.push(99u64).unwrap();

        let received = done_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(received, Some(99));
        handle.join().unwrap();
    }

    #[test]
    fn test_close_unblocks_consumers() {
        let queue: Arc<TaskQueue<u64>> = Arc::new(TaskQueue::new());
        let (done_tx, done_rx) = mpsc::channel();

        let consumer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            done_tx.send(consumer.pop_blocking_or_closed().is_none()).unwrap();
        });

        queue.close();
        assert!(done_rx.recv_timeout(Duration::from_secs(1)).unwrap());
        handle.join().unwrap();
    }

    #[test]
    fn test_push_fails_after_close() {
        let queue = TaskQueue::new();
        queue.close();
        assert_eq!(queue.push(1u64), Err(1));
        assert_eq!(queue.try_pop(), None);
    }
}
