//! Worker pool
//!
//! A fixed set of threads draining one FIFO task queue. Tasks own their
//! inputs; each submission hands back a handle resolving to the task's
//! result. Shutdown drains the queue, joins every worker, and is idempotent.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use thiserror::Error;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Submission was refused because the pool has shut down.
#[derive(Debug, Error)]
#[error("worker pool is stopped")]
pub struct PoolStopped;

/// Handle to a submitted task's eventual result.
pub struct JobHandle<T> {
    receiver: Receiver<T>,
}

impl<T> JobHandle<T> {
    /// A handle that is already resolved.
    pub fn ready(value: T) -> Self {
        let (tx, rx) = bounded(1);
        // The slot is empty; this send cannot fail
        let _ = tx.send(value);
        Self { receiver: rx }
    }

    /// Block until the task resolves. `None` if the result was dropped
    /// before resolving (the task panicked).
    pub fn wait(self) -> Option<T> {
        self.receiver.recv().ok()
    }
}

/// Fixed-size pool of worker threads over a FIFO queue.
pub struct WorkerPool {
    sender: Mutex<Option<Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stopped: AtomicBool,
    num_workers: usize,
}

impl WorkerPool {
    pub fn new(num_workers: usize) -> Self {
        let num_workers = num_workers.max(1);
        let (sender, receiver): (Sender<Task>, Receiver<Task>) = unbounded();

        let workers = (0..num_workers)
            .map(|i| {
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("waveprint-worker-{}", i))
                    .spawn(move || worker_loop(receiver))
                    .unwrap_or_else(|e| panic!("failed to spawn worker thread: {}", e))
            })
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            stopped: AtomicBool::new(false),
            num_workers,
        }
    }

    /// Queue a job; the handle resolves to its return value.
    pub fn submit<F, T>(&self, job: F) -> Result<JobHandle<T>, PoolStopped>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.stopped.load(Ordering::Acquire) {
            return Err(PoolStopped);
        }

        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(PoolStopped);
        };

        let (tx, rx) = bounded(1);
        let task: Task = Box::new(move || {
            let _ = tx.send(job());
        });

        sender.send(task).map_err(|_| PoolStopped)?;
        Ok(JobHandle { receiver: rx })
    }

    /// Tasks queued but not yet picked up by a worker
    pub fn queue_depth(&self) -> usize {
        self.sender
            .lock()
            .as_ref()
            .map(|s| s.len())
            .unwrap_or(0)
    }

    pub fn worker_count(&self) -> usize {
        self.num_workers
    }

    /// Stop accepting tasks, drain the queue, and join every worker.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);

        // Disconnect the queue; workers finish what is already enqueued
        let sender = self.sender.lock().take();
        drop(sender);

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            if handle.join().is_err() {
                log::error!("worker thread panicked during shutdown");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(receiver: Receiver<Task>) {
    while let Ok(task) = receiver.recv() {
        task();
    }
    log::trace!("worker exiting: queue drained and disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_submit_returns_result() {
        let pool = WorkerPool::new(2);
        let handle = pool.submit(|| 40 + 2).unwrap();
        assert_eq!(handle.wait(), Some(42));
    }

    #[test]
    fn test_worker_count_and_floor() {
        assert_eq!(WorkerPool::new(4).worker_count(), 4);
        assert_eq!(WorkerPool::new(0).worker_count(), 1);
    }

    #[test]
    fn test_all_submitted_tasks_run() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap()
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.wait(), Some(()));
        }
        assert_eq!(counter.load(Ordering::Relaxed), 64);
    }

    #[test]
    fn test_shutdown_drains_outstanding_tasks() {
        let pool = WorkerPool::new(1);
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    std::thread::sleep(std::time::Duration::from_millis(1));
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap()
            })
            .collect();

        pool.shutdown();
        assert_eq!(counter.load(Ordering::Relaxed), 16);

        for handle in handles {
            assert_eq!(handle.wait(), Some(()));
        }
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let pool = WorkerPool::new(2);
        pool.shutdown();
        assert!(pool.submit(|| ()).is_err());

        // Idempotent: a second shutdown is a no-op
        pool.shutdown();
        assert_eq!(pool.queue_depth(), 0);
    }

    #[test]
    fn test_ready_handle_resolves_immediately() {
        let handle = JobHandle::ready("done");
        assert_eq!(handle.wait(), Some("done"));
    }
}
