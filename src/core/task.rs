//! Weighted tasks and the decisions a supplier hands back to the pool.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use super::TaskResult;

/// Boxed computation of an admitted task.
pub type TaskFuture<T> = Pin<Box<dyn Future<Output = TaskResult<T>> + Send + 'static>>;

/// A unit of work together with its cost against the pool budget.
///
/// The pool keeps only the weight and the eventual result; the task itself is
/// handed to the spawner as soon as it is admitted.
pub struct WeightedTask<T> {
    /// Cost counted against the pool's `max_weight` while the task is in flight.
    pub weight: u64,
    /// The computation to run.
    pub future: TaskFuture<T>,
}

impl<T> WeightedTask<T> {
    /// Wrap a fallible future with its weight.
    pub fn new<F>(weight: u64, future: F) -> Self
    where
        F: Future<Output = TaskResult<T>> + Send + 'static,
    {
        Self {
            weight,
            future: Box::pin(future),
        }
    }

    /// Wrap an infallible future with its weight.
    pub fn infallible<F>(weight: u64, future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: 'static,
    {
        Self::new(weight, async move { Ok(future.await) })
    }
}

impl<T> fmt::Debug for WeightedTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedTask")
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// What the supplier wants the pool to do after one invocation.
#[derive(Debug)]
pub enum Decision<T> {
    /// These tasks should start now. Expected to be non-empty; an empty batch
    /// is treated like [`Decision::Wait`].
    Admit(Vec<WeightedTask<T>>),
    /// More work exists but none can start yet; ask again after a completion.
    Wait,
    /// No further tasks will ever be produced in this run.
    Exhausted,
}

impl<T> Decision<T> {
    /// Admit a single task.
    #[must_use]
    pub fn single(task: WeightedTask<T>) -> Self {
        Self::Admit(vec![task])
    }

    /// Total weight the decision would add, zero for `Wait`/`Exhausted`.
    /// `None` if the batch's weights overflow `u64`.
    #[must_use]
    pub fn weight(&self) -> Option<u64> {
        match self {
            Self::Admit(tasks) => tasks
                .iter()
                .try_fold(0u64, |total, t| total.checked_add(t.weight)),
            Self::Wait | Self::Exhausted => Some(0),
        }
    }
}

impl<T> From<Vec<WeightedTask<T>>> for Decision<T> {
    fn from(tasks: Vec<WeightedTask<T>>) -> Self {
        Self::Admit(tasks)
    }
}

impl<T> From<Option<Vec<WeightedTask<T>>>> for Decision<T> {
    /// `None` means exhausted; an empty batch means wait.
    fn from(tasks: Option<Vec<WeightedTask<T>>>) -> Self {
        match tasks {
            None => Self::Exhausted,
            Some(tasks) if tasks.is_empty() => Self::Wait,
            Some(tasks) => Self::Admit(tasks),
        }
    }
}
