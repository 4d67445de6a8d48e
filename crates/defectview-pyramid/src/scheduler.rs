//! Background job schedulers
//!
//! Tier builds are plain boxed closures. Where they run is the host's
//! choice:
//!
//! - [`WorkerPool`] - a fixed set of threads fed by a channel
//! - [`DeferredQueue`] - jobs wait until the host calls `run_pending`
//! - [`InlineScheduler`] - jobs run immediately on the submitting thread
//!
//! Every scheduler isolates panics per job, so one failing tier never takes
//! down the others.

use crate::error::{PyramidError, PyramidResult};
use crossbeam_channel::{Sender, unbounded};
use log::{debug, error};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A unit of background work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere to run background jobs
pub trait TaskScheduler: Send + Sync {
    /// Queue `job` for execution.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::SchedulerClosed`] if the scheduler has shut down.
    fn submit(&self, job: Job) -> PyramidResult<()>;

    /// Jobs submitted but not yet finished.
    fn pending(&self) -> usize {
        0
    }
}

/// Run a job, logging instead of propagating a panic.
fn run_isolated(job: Job) {
    if catch_unwind(AssertUnwindSafe(job)).is_err() {
        error!("background job panicked");
    }
}

/// Counter of in-flight jobs with a wait-until-zero facility
#[derive(Debug, Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn add(&self) {
        *self.count.lock() += 1;
    }

    fn done(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn get(&self) -> usize {
        *self.count.lock()
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count > 0 {
            if self.idle.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }
}

/// Fixed-size thread pool
///
/// Dropping the pool shuts it down: jobs still queued are discarded and the
/// workers are joined once their current job returns.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    in_flight: Arc<InFlight>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawn `threads` workers (at least one).
    pub fn new(threads: usize) -> Self {
        let (sender, receiver) = unbounded::<Job>();
        let in_flight = Arc::new(InFlight::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let workers = (0..threads.max(1))
            .map(|i| {
                let receiver = receiver.clone();
                let in_flight = Arc::clone(&in_flight);
                let shutdown = Arc::clone(&shutdown);
                thread::Builder::new()
                    .name(format!("defectview-tier-{i}"))
                    .spawn(move || {
                        while let Ok(job) = receiver.recv() {
                            if shutdown.load(Ordering::Acquire) {
                                drop(job);
                            } else {
                                run_isolated(job);
                            }
                            in_flight.done();
                        }
                    })
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    error!("failed to spawn tier worker: {e}");
                    None
                }
            })
            .collect::<Vec<_>>();
        debug!("worker pool started with {} threads", workers.len());
        Self {
            sender: (!workers.is_empty()).then_some(sender),
            workers,
            in_flight,
            shutdown,
        }
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Block until every submitted job has finished or `timeout` passes.
    /// Returns `true` when idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.in_flight.wait_idle(timeout)
    }

    /// Stop accepting jobs and discard those not yet started.
    ///
    /// Jobs already running finish normally.
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            debug!("worker pool shutting down, {} jobs pending", self.in_flight.get());
        }
    }

    /// Whether [`WorkerPool::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl TaskScheduler for WorkerPool {
    fn submit(&self, job: Job) -> PyramidResult<()> {
        let sender = self.sender.as_ref().ok_or(PyramidError::SchedulerClosed)?;
        if self.is_shut_down() {
            return Err(PyramidError::SchedulerClosed);
        }
        self.in_flight.add();
        if sender.send(job).is_err() {
            self.in_flight.done();
            return Err(PyramidError::SchedulerClosed);
        }
        Ok(())
    }

    fn pending(&self) -> usize {
        self.in_flight.get()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/// Host-polled queue: jobs run when [`DeferredQueue::run_pending`] is called
#[derive(Default)]
pub struct DeferredQueue {
    queue: Mutex<VecDeque<Job>>,
}

impl DeferredQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every queued job in submission order. Returns how many ran.
    ///
    /// Jobs submitted while draining run in the same call.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Some(job) = self.pop() {
            run_isolated(job);
            ran += 1;
        }
        ran
    }

    /// Run only the oldest queued job. Returns `false` when empty.
    pub fn run_one(&self) -> bool {
        match self.pop() {
            Some(job) => {
                run_isolated(job);
                true
            }
            None => false,
        }
    }

    fn pop(&self) -> Option<Job> {
        self.queue.lock().pop_front()
    }
}

impl TaskScheduler for DeferredQueue {
    fn submit(&self, job: Job) -> PyramidResult<()> {
        self.queue.lock().push_back(job);
        Ok(())
    }

    fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

/// Runs each job immediately on the submitting thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineScheduler;

impl TaskScheduler for InlineScheduler {
    fn submit(&self, job: Job) -> PyramidResult<()> {
        run_isolated(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_job(counter: &Arc<AtomicUsize>) -> Job {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_inline_runs_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        InlineScheduler.submit(counting_job(&counter)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deferred_waits_for_host() {
        let counter = Arc::new(AtomicUsize::new(0));
        let q = DeferredQueue::new();
        q.submit(counting_job(&counter)).unwrap();
        q.submit(counting_job(&counter)).unwrap();
        assert_eq!(q.pending(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(q.run_one());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(q.run_pending(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!q.run_one());
    }

    #[test]
    fn test_worker_pool_runs_all() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(3);
        assert_eq!(pool.threads(), 3);
        for _ in 0..20 {
            pool.submit(counting_job(&counter)).unwrap();
        }
        assert!(pool.wait_idle(Duration::from_secs(10)));
        assert_eq!(counter.load(Ordering::SeqCst), 20);
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_shutdown_discards_queued_jobs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
        let pool = WorkerPool::new(1);
        pool.submit(Box::new(move || {
            let _ = gate_rx.recv();
        }))
        .unwrap();
        for _ in 0..5 {
            pool.submit(counting_job(&counter)).unwrap();
        }
        pool.shutdown();
        assert!(pool.is_shut_down());
        assert!(matches!(
            pool.submit(counting_job(&counter)),
            Err(PyramidError::SchedulerClosed)
        ));
        let _ = gate_tx.try_send(());
        drop(gate_tx);
        assert!(pool.wait_idle(Duration::from_secs(10)));
        drop(pool);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panic_is_isolated() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(1);
        pool.submit(Box::new(|| panic!("tier exploded"))).unwrap();
        pool.submit(counting_job(&counter)).unwrap();
        assert!(pool.wait_idle(Duration::from_secs(10)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let q = DeferredQueue::new();
        q.submit(Box::new(|| panic!("tier exploded"))).unwrap();
        q.submit(counting_job(&counter)).unwrap();
        assert_eq!(q.run_pending(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
