//! Worker contract: the user-supplied transform a worker tract runs,
//! plus the factory protocol for per-worker resources and the function
//! adapters.

use std::convert::Infallible;
use std::fmt::Display;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::observe::Context;

/// A unit of user work: transforms one input payload into one output
/// payload.
///
/// Returning `Err` drops the request: it is discarded (with its metadata
/// cleaned up) and never retried; the worker keeps processing. Workers
/// are driven by a single task each, so they may keep mutable state.
#[async_trait]
pub trait Worker<I, O>: Send {
  /// Why a request was dropped. Logged, never propagated.
  type Error: Display + Send;

  /// Performs the work. `ctx` carries the trace span to parent child
  /// spans under, the entry tags, and any deadline the pipeline entry
  /// attached. A deadline signals the worker; it does not abort it.
  async fn work(&mut self, ctx: &Context, input: I) -> Result<O, Self::Error>;

  /// Releases worker-local resources. Called exactly once, after the
  /// worker's task has drained its input; never called for workers whose
  /// construction failed.
  async fn close(&mut self) {}
}

/// Makes the workers a worker tract runs, one per worker slot. The
/// factory owns resources shared by its workers; each worker owns its
/// worker-local resources.
#[async_trait]
pub trait WorkerFactory<I, O>: Send + Sync {
  type Worker: Worker<I, O> + 'static;

  async fn make_worker(&self) -> Result<Self::Worker, BoxError>;

  /// Releases factory resources. Only invoked by a worker tract built
  /// with `close_factory(true)`; by default the user owns the factory so
  /// the tract can be initialized again.
  fn close(&self) {}
}

/// Factory that clones a prototype worker for every slot.
pub struct CloneFactory<W> {
  prototype: W,
}

impl<W> CloneFactory<W> {
  pub fn new(prototype: W) -> Self {
    Self { prototype }
  }
}

#[async_trait]
impl<I, O, W> WorkerFactory<I, O> for CloneFactory<W>
where
  I: Send + 'static,
  O: Send + 'static,
  W: Worker<I, O> + Clone + Sync + 'static,
{
  type Worker = W;

  async fn make_worker(&self) -> Result<W, BoxError> {
    Ok(self.prototype.clone())
  }
}

/// Worker applying a plain infallible function to each payload.
#[derive(Clone)]
pub struct FnWorker<F> {
  f: F,
}

impl<F> FnWorker<F> {
  pub fn new(f: F) -> Self {
    Self { f }
  }
}

#[async_trait]
impl<I, O, F> Worker<I, O> for FnWorker<F>
where
  I: Send + 'static,
  O: Send + 'static,
  F: FnMut(I) -> O + Send,
{
  type Error = Infallible;

  async fn work(&mut self, _ctx: &Context, input: I) -> Result<O, Infallible> {
    Ok((self.f)(input))
  }
}

/// Worker applying a fallible, context-aware function to each payload.
pub struct TryFnWorker<F, E> {
  f: F,
  _err: PhantomData<fn() -> E>,
}

impl<F, E> TryFnWorker<F, E> {
  pub fn new(f: F) -> Self {
    Self { f, _err: PhantomData }
  }
}

impl<F: Clone, E> Clone for TryFnWorker<F, E> {
  fn clone(&self) -> Self {
    Self { f: self.f.clone(), _err: PhantomData }
  }
}

#[async_trait]
impl<I, O, E, F> Worker<I, O> for TryFnWorker<F, E>
where
  I: Send + 'static,
  O: Send + 'static,
  E: Display + Send + 'static,
  F: FnMut(&Context, I) -> Result<O, E> + Send,
{
  type Error = E;

  async fn work(&mut self, ctx: &Context, input: I) -> Result<O, E> {
    (self.f)(ctx, input)
  }
}
