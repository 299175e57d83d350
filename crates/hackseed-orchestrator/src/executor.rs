//! Stage executor: bounded, input-ordered, cancellable.
//!
//! Every stage runs one async operation per identity. At most `limit`
//! operations are in flight (a `Semaphore`), results land in an
//! index-addressed buffer so output order equals input order, and the
//! cancel flag is checked before each identity starts. An operation that
//! already started always runs to completion, so the records returned after
//! a cancellation are exactly those of the identities that were started, a
//! prefix of the input.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// Sender side of the cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

/// Receiver side of the cancellation flag, cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

/// A fresh, unset cancellation pair.
/// Milliseconds since `since`, saturating.
pub fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(Arc::new(tx)), CancelSignal(rx))
}

impl CancelHandle {
    /// Request cancellation. Identities already started finish normally.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal(self.0.subscribe())
    }
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        cancel_pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

/// Records of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult<T> {
    /// One record per started identity, in input order.
    pub records: Vec<T>,
    /// Whether the stage stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl<T> StageResult<T> {
    pub fn completed(records: Vec<T>) -> Self {
        Self {
            records,
            cancelled: false,
        }
    }
}

/// Run `op(index, item)` for every item with at most `limit` in flight.
///
/// `limit == 0` is treated as 1.
pub async fn run_stage<I, T, F, Fut>(items: Vec<I>, limit: usize, cancel: &CancelSignal, op: F) -> StageResult<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(usize, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let total = items.len();
    let op = Arc::new(op);
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
    let mut tasks = JoinSet::new();
    let mut cancelled = false;

    for (index, item) in items.into_iter().enumerate() {
        // Closed only if dropped, which cannot happen while we hold it.
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        if cancel.is_cancelled() {
            tracing::info!(started = index, total, "stage cancelled");
            cancelled = true;
            break;
        }
        let op = Arc::clone(&op);
        tasks.spawn(async move {
            let _permit = permit;
            (index, op(index, item).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, record)) => slots[index] = Some(record),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => tracing::error!(error = %e, "stage task aborted"),
        }
    }

    StageResult {
        records: slots.into_iter().flatten().collect(),
        cancelled,
    }
}
