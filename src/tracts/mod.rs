//! The structural tract variants and their constructors.

mod fan_out;
mod parallel;
mod serial;
mod worker;

#[cfg(test)]
mod parallel_test;
#[cfg(test)]
mod worker_test;

pub use fan_out::FanOutGroupTract;
pub use parallel::ParallelGroupTract;
pub use serial::{Linker, SerialGroupTract};
pub use worker::WorkerTract;

use crate::observe::Context;
use crate::tract::Tract;
use crate::worker::{CloneFactory, FnWorker, TryFnWorker, WorkerFactory};

/// A worker tract running `size` workers made by `factory`.
pub fn worker_tract<I, O, F>(
  name: impl Into<String>,
  size: usize,
  factory: F,
) -> WorkerTract<I, O, F>
where
  I: Send + 'static,
  O: Send + 'static,
  F: WorkerFactory<I, O>,
{
  WorkerTract::new(name, size, factory)
}

/// A worker tract cloning `worker` into every slot.
pub fn worker_tract_from<I, O, W>(
  name: impl Into<String>,
  size: usize,
  worker: W,
) -> WorkerTract<I, O, CloneFactory<W>>
where
  I: Send + 'static,
  O: Send + 'static,
  W: crate::worker::Worker<I, O> + Clone + Sync + 'static,
{
  WorkerTract::new(name, size, CloneFactory::new(worker))
}

/// A worker tract applying a plain function, e.g. `func_tract("sqrt", 4, f64::sqrt)`.
pub fn func_tract<I, O, F>(
  name: impl Into<String>,
  size: usize,
  f: F,
) -> WorkerTract<I, O, CloneFactory<FnWorker<F>>>
where
  I: Send + 'static,
  O: Send + 'static,
  F: FnMut(I) -> O + Clone + Send + Sync + 'static,
{
  worker_tract_from(name, size, FnWorker::new(f))
}

/// A worker tract applying a fallible, context-aware function; an `Err`
/// return drops the request.
pub fn try_func_tract<I, O, E, F>(
  name: impl Into<String>,
  size: usize,
  f: F,
) -> WorkerTract<I, O, CloneFactory<TryFnWorker<F, E>>>
where
  I: Send + 'static,
  O: Send + 'static,
  E: std::fmt::Display + Send + 'static,
  F: FnMut(&Context, I) -> Result<O, E> + Clone + Send + Sync + 'static,
{
  worker_tract_from(name, size, TryFnWorker::new(f))
}

/// Chains `head` into `tail` as a serial group.
pub fn serial<I, M, O>(
  name: impl Into<String>,
  head: impl Tract<I, M> + 'static,
  tail: impl Tract<M, O> + 'static,
) -> SerialGroupTract<I, M, O>
where
  I: Send + 'static,
  M: Send + 'static,
  O: Send + 'static,
{
  SerialGroupTract::new(name, head, tail)
}

/// Runs `tracts` side by side over a shared input and output.
pub fn parallel<I, O>(
  name: impl Into<String>,
  tracts: Vec<Box<dyn Tract<I, O>>>,
) -> ParallelGroupTract<I, O>
where
  I: Send + 'static,
  O: Send + 'static,
{
  ParallelGroupTract::new(name, tracts)
}

/// Clones every request `head` produces to each tract in `tails`.
pub fn fan_out<I, M, O>(
  name: impl Into<String>,
  head: impl Tract<I, M> + 'static,
  tails: Vec<Box<dyn Tract<M, O>>>,
) -> FanOutGroupTract<I, M, O>
where
  I: Send + 'static,
  M: Clone + Send + 'static,
  O: Send + 'static,
{
  FanOutGroupTract::new(name, head, tails)
}
