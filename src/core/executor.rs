//! Caller-facing seams: the work supplier and the task spawner.

use std::future::Future;

use super::Decision;

/// Decides what the pool runs next.
///
/// Invoked synchronously with the weight currently in flight, never while a
/// previous invocation is still on the stack. Implementations must not block.
///
/// Any `FnMut(u64) -> Decision<T> + Send` closure is a supplier.
///
/// # Example
///
/// ```rust,ignore
/// use weighted_task_pool::core::{Decision, WeightedTask};
///
/// let mut remaining = vec![4u64, 8, 2];
/// let supplier = move |current: u64| match remaining.pop() {
///     None => Decision::Exhausted,
///     Some(w) if current + w > 10 => {
///         remaining.push(w);
///         Decision::Wait
///     }
///     Some(w) => Decision::single(WeightedTask::infallible(w, async move { w * 2 })),
/// };
/// ```
pub trait Supplier<T>: Send {
    /// Produce the next decision given the in-flight weight.
    fn next(&mut self, current_weight: u64) -> Decision<T>;
}

impl<T, F> Supplier<T> for F
where
    F: FnMut(u64) -> Decision<T> + Send,
{
    fn next(&mut self, current_weight: u64) -> Decision<T> {
        self(current_weight)
    }
}

/// Abstraction for spawning admitted tasks on a runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
