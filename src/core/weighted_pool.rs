//! Weight-bounded pool and its control loop.
//!
//! A run alternates between two things: asking the [`Supplier`] for work while
//! spare budget exists, and waiting for admitted tasks to settle. Every
//! settlement re-enters the same decision point, so bursts of completions are
//! each evaluated against the full state rather than assumed to be the only
//! change.
//!
//! Run state is owned by the run future alone. Spawned tasks never touch it;
//! they report back through a single-consumer channel and the run applies the
//! events one at a time.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn, Instrument};
use uuid::Uuid;

use crate::config::TaskFailurePolicy;
use crate::core::{Decision, PoolError, Spawn, Supplier, TaskResult, WeightedTask};
#[cfg(feature = "tokio-runtime")]
use crate::runtime::TokioSpawner;

/// Counters collected over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Number of times the supplier was consulted.
    pub supplier_calls: u64,
    /// Tasks admitted.
    pub admitted: u64,
    /// Tasks that settled with a value.
    pub completed: u64,
    /// Tasks that settled with an error or panicked.
    pub failed: u64,
    /// Highest in-flight weight observed.
    pub peak_weight: u64,
}

/// Output of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolResults<T> {
    /// Task values in completion order.
    pub results: Vec<T>,
    /// Run counters.
    pub stats: RunStats,
}

/// How an admitted task settled.
enum Outcome<T> {
    Completed(T),
    Failed(String),
    Panicked,
}

/// Event sent by a spawned task back into the control loop.
struct Settled<T> {
    weight: u64,
    outcome: Outcome<T>,
}

/// Sends the settlement event when dropped, so a task that panics or is
/// dropped by its runtime still releases its weight.
struct SettleGuard<T> {
    weight: u64,
    result: Option<TaskResult<T>>,
    events: UnboundedSender<Settled<T>>,
}

impl<T> SettleGuard<T> {
    /// Record the task's result and send it.
    fn settle(mut self, result: TaskResult<T>) {
        self.result = Some(result);
    }
}

impl<T> Drop for SettleGuard<T> {
    fn drop(&mut self) {
        let outcome = match self.result.take() {
            Some(Ok(value)) => Outcome::Completed(value),
            Some(Err(e)) => Outcome::Failed(format!("{e:#}")),
            None => Outcome::Panicked,
        };
        // Receiver is gone once the run has been dropped; nothing to report to.
        if self
            .events
            .unbounded_send(Settled {
                weight: self.weight,
                outcome,
            })
            .is_err()
        {
            trace!(weight = self.weight, "settlement discarded: run was abandoned");
        }
    }
}

/// Mutable state of a single run.
struct RunState<T> {
    current_weight: u64,
    in_flight: u64,
    has_more: bool,
    results: Vec<T>,
    failure: Option<PoolError>,
    stats: RunStats,
}

impl<T> RunState<T> {
    const fn new() -> Self {
        Self {
            current_weight: 0,
            in_flight: 0,
            has_more: true,
            results: Vec::new(),
            failure: None,
            stats: RunStats {
                supplier_calls: 0,
                admitted: 0,
                completed: 0,
                failed: 0,
                peak_weight: 0,
            },
        }
    }

    /// True while the supplier may still be consulted.
    const fn accepting(&self) -> bool {
        self.has_more && self.failure.is_none()
    }

    const fn drained(&self) -> bool {
        !self.accepting() && self.current_weight == 0 && self.in_flight == 0
    }
}

/// Result of one pass through the decision point.
enum Step {
    /// Waiting for a settlement to re-enter.
    Pending,
    /// All work is done.
    Finished,
}

/// Clears the running flag when a run completes, fails or is dropped.
struct RunGuard<'a> {
    running: &'a AtomicBool,
    current_weight: &'a AtomicU64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.current_weight.store(0, Ordering::Release);
        self.running.store(false, Ordering::Release);
    }
}

/// Future returned by [`WeightedPool::run`].
///
/// Dropping it before completion abandons the run: the pool becomes runnable
/// again and already-spawned tasks keep going on their own.
#[must_use = "a run does nothing beyond its first decision unless awaited"]
pub struct PoolRun<'a, T> {
    inner: Pin<Box<dyn Future<Output = Result<PoolResults<T>, PoolError>> + Send + 'a>>,
}

impl<T> Future for PoolRun<'_, T> {
    type Output = Result<PoolResults<T>, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for PoolRun<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRun").finish_non_exhaustive()
    }
}

/// Pool that keeps the summed weight of in-flight tasks within a budget.
///
/// The pool never decides what to run: each time budget is free it asks the
/// supplier, which either starts tasks, asks to wait for a completion, or
/// reports that it is exhausted. A run finishes once the supplier is exhausted
/// and every admitted task has settled.
///
/// # Example
///
/// ```rust,ignore
/// use weighted_task_pool::core::{Decision, WeightedPool, WeightedTask};
///
/// let mut sizes = vec![300u64, 120, 80].into_iter();
/// let pool = WeightedPool::new(400, move |_current: u64| match sizes.next() {
///     Some(size) => Decision::single(WeightedTask::infallible(size, async move { size })),
///     None => Decision::Exhausted,
/// })?;
/// let out = pool.run()?.await?;
/// ```
pub struct WeightedPool<T, F, S> {
    max_weight: u64,
    failure_policy: TaskFailurePolicy,
    supplier: Mutex<F>,
    spawner: S,
    running: AtomicBool,
    /// Mirror of the active run's in-flight weight, for observers.
    current_weight: AtomicU64,
    _result_marker: PhantomData<fn() -> T>,
}

fn check_max_weight(max_weight: u64) -> Result<(), PoolError> {
    if max_weight == 0 {
        return Err(PoolError::InvalidConfiguration(
            "max weight must be positive".into(),
        ));
    }
    Ok(())
}

#[cfg(feature = "tokio-runtime")]
impl<T, F> WeightedPool<T, F, TokioSpawner> {
    /// Create a pool that spawns tasks on the current tokio runtime.
    pub fn new(max_weight: u64, supplier: F) -> Result<Self, PoolError> {
        check_max_weight(max_weight)?;
        Self::with_spawner(max_weight, supplier, TokioSpawner::current()?)
    }
}

impl<T, F, S> WeightedPool<T, F, S> {
    /// Create a pool with an explicit spawner.
    pub fn with_spawner(max_weight: u64, supplier: F, spawner: S) -> Result<Self, PoolError> {
        check_max_weight(max_weight)?;
        Ok(Self {
            max_weight,
            failure_policy: TaskFailurePolicy::default(),
            supplier: Mutex::new(supplier),
            spawner,
            running: AtomicBool::new(false),
            current_weight: AtomicU64::new(0),
            _result_marker: PhantomData,
        })
    }

    /// Set what happens when an admitted task fails.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: TaskFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Budget ceiling.
    pub const fn max_weight(&self) -> u64 {
        self.max_weight
    }

    /// Configured failure policy.
    pub const fn failure_policy(&self) -> TaskFailurePolicy {
        self.failure_policy
    }

    /// Weight currently in flight for the active run, zero when idle.
    pub fn current_weight(&self) -> u64 {
        self.current_weight.load(Ordering::Acquire)
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl<T, F, S> WeightedPool<T, F, S>
where
    T: Send + 'static,
    F: Supplier<T>,
    S: Spawn + Sync,
{
    /// Start a run.
    ///
    /// Fails immediately with [`PoolError::AlreadyRunning`] if a previous run
    /// has not finished; that run is left untouched. Otherwise state is reset
    /// and the first decision is taken before this returns, so the supplier
    /// may already have been called and tasks spawned. The returned future
    /// resolves once the supplier is exhausted and every admitted task has
    /// settled.
    pub fn run(&self) -> Result<PoolRun<'_, T>, PoolError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("run rejected: pool is already running");
            return Err(PoolError::AlreadyRunning);
        }
        let guard = RunGuard {
            running: &self.running,
            current_weight: &self.current_weight,
        };
        self.current_weight.store(0, Ordering::Release);

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("weighted_pool.run", %run_id, max_weight = self.max_weight);
        let (events_tx, events_rx) = mpsc::unbounded();
        let mut state = RunState::new();
        let first = span.in_scope(|| self.decide(&mut state, &events_tx));

        let fut = async move {
            let _guard = guard;
            self.drive(state, first, events_tx, events_rx).await
        }
        .instrument(span);

        Ok(PoolRun {
            inner: Box::pin(fut),
        })
    }

    async fn drive(
        &self,
        mut state: RunState<T>,
        first: Result<Step, PoolError>,
        events_tx: UnboundedSender<Settled<T>>,
        mut events_rx: UnboundedReceiver<Settled<T>>,
    ) -> Result<PoolResults<T>, PoolError> {
        let mut step = first?;
        while let Step::Pending = step {
            // We hold a sender ourselves, so the stream cannot end while tasks are out.
            let Some(event) = events_rx.next().await else {
                return Err(PoolError::InvariantViolation(
                    "settlement channel closed with tasks in flight".into(),
                ));
            };
            self.on_settled(&mut state, event)?;
            step = self.decide(&mut state, &events_tx)?;
        }
        self.finish(state)
    }

    /// The decision point, entered at run start and after every settlement.
    fn decide(
        &self,
        state: &mut RunState<T>,
        events: &UnboundedSender<Settled<T>>,
    ) -> Result<Step, PoolError> {
        debug!(
            current_weight = state.current_weight,
            in_flight = state.in_flight,
            has_more = state.has_more,
            "decision point"
        );
        if state.drained() {
            return Ok(Step::Finished);
        }

        if state.accepting() && state.current_weight < self.max_weight {
            state.stats.supplier_calls += 1;
            let decision = self.supplier.lock().next(state.current_weight);
            match decision {
                Decision::Exhausted => {
                    debug!("supplier exhausted");
                    state.has_more = false;
                    if state.drained() {
                        return Ok(Step::Finished);
                    }
                }
                Decision::Admit(tasks) if !tasks.is_empty() => {
                    for task in tasks {
                        self.admit(state, task, events)?;
                    }
                }
                Decision::Admit(_) | Decision::Wait => {
                    if state.in_flight == 0 {
                        warn!("supplier asked to wait with nothing in flight");
                        return Err(PoolError::Stalled);
                    }
                    debug!("supplier asked to wait");
                }
            }
            Ok(Step::Pending)
        } else if state.in_flight > 0 {
            debug!("waiting for a task to settle");
            Ok(Step::Pending)
        } else {
            Err(PoolError::InvariantViolation(format!(
                "idle with nothing in flight: current_weight={}, has_more={}",
                state.current_weight, state.has_more
            )))
        }
    }

    /// Account for one task and hand it to the spawner.
    ///
    /// An overflowing weight fails the run; the task is not spawned, and any
    /// tasks after it in the same batch are never started.
    fn admit(
        &self,
        state: &mut RunState<T>,
        task: WeightedTask<T>,
        events: &UnboundedSender<Settled<T>>,
    ) -> Result<(), PoolError> {
        let WeightedTask { weight, future } = task;
        state.current_weight = state.current_weight.checked_add(weight).ok_or_else(|| {
            PoolError::InvariantViolation(format!(
                "weight overflow admitting {weight} on top of {}",
                state.current_weight
            ))
        })?;
        state.in_flight += 1;
        state.stats.admitted += 1;
        state.stats.peak_weight = state.stats.peak_weight.max(state.current_weight);
        self.current_weight
            .store(state.current_weight, Ordering::Release);
        debug!(weight, current_weight = state.current_weight, "admitted task");

        let settle = SettleGuard {
            weight,
            result: None,
            events: events.clone(),
        };
        self.spawner.spawn(async move {
            settle.settle(future.await);
        });
        Ok(())
    }

    fn on_settled(&self, state: &mut RunState<T>, event: Settled<T>) -> Result<(), PoolError> {
        let Settled { weight, outcome } = event;
        state.current_weight = state.current_weight.checked_sub(weight).ok_or_else(|| {
            PoolError::InvariantViolation(format!(
                "settled weight {weight} exceeds in-flight weight {}",
                state.current_weight
            ))
        })?;
        state.in_flight = state.in_flight.checked_sub(1).ok_or_else(|| {
            PoolError::InvariantViolation("settlement with no task in flight".into())
        })?;
        self.current_weight
            .store(state.current_weight, Ordering::Release);

        match outcome {
            Outcome::Completed(value) => {
                debug!(weight, "task completed");
                state.results.push(value);
                state.stats.completed += 1;
            }
            Outcome::Failed(message) => {
                warn!(weight, error = %message, "task failed");
                state.stats.failed += 1;
                self.record_failure(state, PoolError::TaskFailed(message));
            }
            Outcome::Panicked => {
                warn!(weight, "task panicked before completing");
                state.stats.failed += 1;
                self.record_failure(state, PoolError::TaskPanicked);
            }
        }
        Ok(())
    }

    fn record_failure(&self, state: &mut RunState<T>, error: PoolError) {
        if self.failure_policy == TaskFailurePolicy::FailRun && state.failure.is_none() {
            debug!("failing run after in-flight tasks drain");
            state.failure = Some(error);
        }
    }

    fn finish(&self, mut state: RunState<T>) -> Result<PoolResults<T>, PoolError> {
        if !state.drained() {
            return Err(PoolError::InvariantViolation(format!(
                "finish with current_weight={}, in_flight={}, has_more={}",
                state.current_weight, state.in_flight, state.has_more
            )));
        }
        if let Some(error) = state.failure.take() {
            warn!(error = %error, "run failed");
            return Err(error);
        }
        info!(
            results = state.results.len(),
            supplier_calls = state.stats.supplier_calls,
            failed = state.stats.failed,
            peak_weight = state.stats.peak_weight,
            "all work completed"
        );
        Ok(PoolResults {
            results: state.results,
            stats: state.stats,
        })
    }
}
