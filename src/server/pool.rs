use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Every worker is busy and the queue is full.
    Saturated,
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolError::Saturated => write!(f, "worker queue is full"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Bounds how many connections are served and queued at once.
///
/// At most `workers` tasks run concurrently; up to `queue_depth` more wait
/// for a worker. Work beyond that is refused at admission.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    admission: Arc<Semaphore>,
    workers: Arc<Semaphore>,
}

/// A reserved slot in the pool, released when the spawned task ends.
#[derive(Debug)]
pub struct Admission {
    permit: OwnedSemaphorePermit,
    workers: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(workers: usize, queue_depth: usize) -> Self {
        let workers = workers.max(1);
        Self {
            admission: Arc::new(Semaphore::new(workers + queue_depth)),
            workers: Arc::new(Semaphore::new(workers)),
        }
    }

    /// Reserves a slot without blocking.
    pub fn try_admit(&self) -> Result<Admission, PoolError> {
        let permit = self
            .admission
            .clone()
            .try_acquire_owned()
            .map_err(|_| PoolError::Saturated)?;
        Ok(Admission {
            permit,
            workers: self.workers.clone(),
        })
    }

    /// Queues `task`, failing immediately if the pool is saturated.
    pub fn submit<F>(&self, task: F) -> Result<JoinHandle<F::Output>, PoolError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        Ok(self.try_admit()?.spawn(task))
    }

    /// Slots left before admission starts failing.
    pub fn available(&self) -> usize {
        self.admission.available_permits()
    }
}

impl Admission {
    /// Runs `task` once a worker is free.
    pub fn spawn<F>(self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let Admission { permit, workers } = self;
        tokio::spawn(async move {
            let _admitted = permit;
            // The semaphore is never closed, so this only waits.
            let _worker = workers.acquire_owned().await.ok();
            task.await
        })
    }
}
