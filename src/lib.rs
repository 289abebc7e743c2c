//! # Weighted Task Pool
//!
//! A weight-bounded concurrent task pool: it runs an open-ended stream of
//! asynchronous tasks such that the summed weight of everything in flight stays
//! within a fixed budget.
//!
//! ## Core Problem Solved
//!
//! A plain "at most N at once" limit treats every task alike. When tasks differ
//! in cost (uploads of different sizes, model calls of different lengths) the
//! useful limit is on the total cost in flight instead:
//!
//! - **Weighted admission**: every task carries a caller-assigned weight
//! - **Caller-driven work**: the pool never decides what runs; a supplier does
//! - **Level-triggered loop**: every completion re-evaluates the whole state
//! - **Runtime-agnostic core**: tasks are spawned through a [`core::Spawn`] seam
//!
//! ## Usage
//!
//! ```rust,ignore
//! use weighted_task_pool::core::{Decision, WeightedPool, WeightedTask};
//!
//! let mut uploads = pending_uploads().into_iter().peekable();
//! let pool = WeightedPool::new(64 * 1024 * 1024, move |in_flight: u64| {
//!     let Some(next) = uploads.peek() else {
//!         return Decision::Exhausted;
//!     };
//!     if in_flight + next.len() > 64 * 1024 * 1024 {
//!         return Decision::Wait;
//!     }
//!     let upload = uploads.next().unwrap();
//!     Decision::single(WeightedTask::new(upload.len(), upload.send()))
//! })?;
//!
//! let out = pool.run()?.await?;
//! println!("{} uploads, peak {} bytes", out.results.len(), out.stats.peak_weight);
//! ```
//!
//! The supplier sees the in-flight weight every time it is asked, including
//! weight it admitted a moment ago. Returning [`core::Decision::Wait`] with
//! nothing in flight fails the run with [`core::PoolError::Stalled`].

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core pool abstractions and weight accounting.
pub mod core;
/// Configuration models for pools.
pub mod config;
/// Builders to construct pools from configuration.
pub mod builders;
/// Runtime adapters for spawning tasks.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::core::{Decision, PoolError, PoolResults, RunStats, WeightedPool, WeightedTask};
