use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::EncoderError;

/// Callback receiving completed/total after each finished job.
pub type ProgressCallback = Arc<dyn Fn(f32) + Send + Sync>;

/// Runs CPU-bound frame jobs on tokio's blocking pool, at most
/// `num_workers` at a time, and hands results back in submission order.
///
/// Submitting never blocks: a job waits for a worker permit inside its own
/// task.
pub struct FrameScheduler<T> {
    handle: Handle,
    permits: Arc<Semaphore>,
    num_workers: usize,
    jobs: Vec<JoinHandle<Result<T, EncoderError>>>,
    submitted: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
    progress: Option<ProgressCallback>,
}

impl<T: Send + 'static> FrameScheduler<T> {
    /// Create a scheduler on the current tokio runtime.
    pub fn new(num_workers: usize) -> Result<Self, EncoderError> {
        let handle = Handle::try_current().map_err(|e| EncoderError::Runtime(e.to_string()))?;
        Ok(Self::with_handle(handle, num_workers))
    }

    pub fn with_handle(handle: Handle, num_workers: usize) -> Self {
        Self {
            handle,
            permits: Arc::new(Semaphore::new(num_workers)),
            num_workers,
            jobs: Vec::new(),
            submitted: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
            progress: None,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Jobs submitted and not yet joined.
    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    pub fn set_progress(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    /// Queue `job` for execution.
    ///
    /// Fails with [`EncoderError::ResourceExhausted`] when the scheduler has
    /// no workers or has been shut down.
    pub fn submit<F>(&mut self, job: F) -> Result<(), EncoderError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        if self.num_workers == 0 {
            return Err(EncoderError::ResourceExhausted("scheduler has no workers"));
        }
        if self.permits.is_closed() {
            return Err(EncoderError::ResourceExhausted("scheduler is shut down"));
        }

        let index = self.jobs.len();
        let permits = self.permits.clone();
        let submitted = self.submitted.clone();
        let completed = self.completed.clone();
        let progress = self.progress.clone();
        submitted.fetch_add(1, Ordering::SeqCst);

        let task = self.handle.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| EncoderError::ResourceExhausted("scheduler is shut down"))?;

            let output = tokio::task::spawn_blocking(job)
                .await
                .map_err(|e| EncoderError::Job(format!("frame {index}: {e}")))?;

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            let total = submitted.load(Ordering::SeqCst).max(done);
            tracing::debug!(job = index, done, total, "Frame job finished");
            if let Some(callback) = progress {
                (*callback)(done as f32 / total as f32);
            }
            Ok(output)
        });
        self.jobs.push(task);
        Ok(())
    }

    /// Wait for every submitted job and return the outputs in submission order.
    ///
    /// The first failed job, in submission order, becomes the error.
    pub async fn join(&mut self) -> Result<Vec<T>, EncoderError> {
        let jobs = std::mem::take(&mut self.jobs);
        let results = join_all(jobs).await;

        let mut outputs = Vec::with_capacity(results.len());
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(output) => outputs.push(output?),
                Err(e) => return Err(EncoderError::Job(format!("frame {index}: {e}"))),
            }
        }
        Ok(outputs)
    }

    /// Stop accepting work and abort queued and running jobs.
    ///
    /// Blocking closures already running finish in the background; their
    /// results are dropped.
    pub fn shutdown(&mut self) {
        self.permits.close();
        for job in self.jobs.drain(..) {
            job.abort();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }
}

impl<T> Drop for FrameScheduler<T> {
    fn drop(&mut self) {
        for job in &self.jobs {
            job.abort();
        }
    }
}
