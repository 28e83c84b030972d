//! Bounded fan-out of one upload to many per-size transforms.
//!
//! ## Model
//!
//! ```text
//!                    ┌── worker loop ──┐
//! tokens ─► job queue ├── worker loop ──┼─► result queue ─► barrier read (N items)
//!   (N, closed)      └── worker loop ──┘        (N)
//! ```
//!
//! For each request the [`Dispatcher`] creates a job queue and a result queue,
//! both with capacity exactly equal to the token count `N`. Every token
//! (blanks included) is enqueued up front without blocking, the job queue is
//! closed, and `min(pool_size, N)` worker loops drain it. The caller then
//! reads exactly `N` results before returning.
//!
//! ## Invariants
//!
//! - One result per job consumed, always. Failures, blanks, cancellations and
//!   even engine panics all produce a [`ResultItem`]; a worker never skips its
//!   send, so the barrier read cannot hang.
//! - If every result sender disappears early the barrier stops instead of
//!   blocking.
//! - Result order is arrival order. Items are identified by their label.
//! - Cancellation is checked once, when a worker picks up a job. A job that
//!   has started always finishes and keeps its result.
//!
//! ## Process-wide bound
//!
//! Worker loops run on a single [`rayon::ThreadPool`] of `pool_size` threads
//! owned by the dispatcher and shared by every request. At most `pool_size`
//! transforms run at once across the whole process; a second request queues
//! behind the first instead of adding threads.

use crate::cancel::CancelToken;
use crate::imaging::{
    ImageEngine, ItemStatus, Quality, ResultItem, TransformError, TransformOptions, transform,
};
use crate::sizes::SizeToken;
use std::any::Any;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Worker count used when none is configured.
pub const DEFAULT_POOL_SIZE: usize = 5;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("pool size must be at least 1")]
    EmptyPool,
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Configuration for a [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Maximum number of transforms running at once, process-wide.
    pub pool_size: usize,
    pub transform: TransformOptions,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            transform: TransformOptions::default(),
        }
    }
}

/// Every result of one request, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any size was skipped because the request was cancelled.
    pub fn has_cancelled(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.status == ItemStatus::Cancelled)
    }

    /// Labels of sizes that failed or were cancelled. Blanks are not failures.
    pub fn failed_labels(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| item.is_failure())
            .map(|item| item.label.as_str())
            .collect()
    }

    /// Keep only items with a payload.
    pub fn into_usable(self) -> Vec<ResultItem> {
        self.items
            .into_iter()
            .filter(ResultItem::is_usable)
            .collect()
    }
}

impl From<Vec<ResultItem>> for ResultSet {
    fn from(items: Vec<ResultItem>) -> Self {
        Self { items }
    }
}

/// Bounded worker pool that runs one transform per size token.
pub struct Dispatcher<E> {
    engine: Arc<E>,
    pool: Arc<rayon::ThreadPool>,
    config: DispatchConfig,
}

impl<E> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            pool: Arc::clone(&self.pool),
            config: self.config,
        }
    }
}

/// Shared, read-only inputs of one request's jobs.
struct JobContext<E> {
    engine: Arc<E>,
    raw: Arc<[u8]>,
    quality: Quality,
    options: TransformOptions,
    cancel: CancelToken,
}

impl<E: ImageEngine + 'static> Dispatcher<E> {
    pub fn new(engine: E, config: DispatchConfig) -> Result<Self, DispatchError> {
        if config.pool_size == 0 {
            return Err(DispatchError::EmptyPool);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.pool_size)
            .thread_name(|i| format!("akira-worker-{i}"))
            .panic_handler(|_| error!("worker thread panicked outside a job"))
            .build()?;
        Ok(Self {
            engine: Arc::new(engine),
            pool: Arc::new(pool),
            config,
        })
    }

    /// Run one transform per token and return every result.
    ///
    /// Blocks the calling thread until all `tokens.len()` results have
    /// arrived. Must not be called from one of this dispatcher's own worker
    /// threads.
    pub fn resize_all(
        &self,
        raw: Arc<[u8]>,
        tokens: Vec<SizeToken>,
        quality: Quality,
        cancel: &CancelToken,
    ) -> ResultSet {
        let expected = tokens.len();
        if expected == 0 {
            return ResultSet::default();
        }

        let (job_tx, job_rx) = bounded::<SizeToken>(expected);
        let (result_tx, result_rx) = bounded::<ResultItem>(expected);

        // Capacity is exact, so none of these sends block.
        let mut submitted = 0;
        for token in tokens {
            if job_tx.send(token).is_err() {
                break;
            }
            submitted += 1;
        }
        drop(job_tx);

        let context = Arc::new(JobContext {
            engine: Arc::clone(&self.engine),
            raw,
            quality,
            options: self.config.transform,
            cancel: cancel.clone(),
        });

        let workers = self.config.pool_size.min(submitted);
        debug!(jobs = submitted, workers, "dispatching");
        for worker in 0..workers {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let context = Arc::clone(&context);
            self.pool
                .spawn(move || worker_loop(worker, &jobs, &results, &context));
        }
        drop(job_rx);
        drop(result_tx);

        let mut items = Vec::with_capacity(submitted);
        for _ in 0..submitted {
            match result_rx.recv() {
                Ok(item) => items.push(item),
                Err(_) => {
                    error!(
                        received = items.len(),
                        expected = submitted,
                        "result queue closed before every job reported"
                    );
                    break;
                }
            }
        }
        ResultSet::from(items)
    }
}

fn worker_loop<E: ImageEngine>(
    worker: usize,
    jobs: &Receiver<SizeToken>,
    results: &Sender<ResultItem>,
    context: &JobContext<E>,
) {
    // The queue is closed before workers start, so recv never waits on a producer.
    while let Ok(token) = jobs.recv() {
        let item = run_job(&token, context);
        if results.send(item).is_err() {
            warn!(worker, "result queue dropped; stopping worker");
            break;
        }
    }
}

/// Run one job, converting every failure into an empty-payload item.
fn run_job<E: ImageEngine>(token: &SizeToken, context: &JobContext<E>) -> ResultItem {
    if token.is_blank() {
        return ResultItem::blank();
    }
    if context.cancel.is_cancelled() {
        debug!(size = %token, "skipping size; request cancelled");
        return ResultItem::cancelled(token.as_str());
    }

    let start = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        transform(
            context.engine.as_ref(),
            &context.raw,
            token,
            context.quality,
            &context.options,
        )
    }))
    .unwrap_or_else(|panic| Err(TransformError::Panicked(panic_message(&*panic))));

    match outcome {
        Ok(item) => {
            info!(size = %token, elapsed = ?start.elapsed(), "processed image");
            item
        }
        Err(err) => {
            warn!(size = %token, error = %err, "transform failed");
            ResultItem::failed(token.as_str(), err.to_string())
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
