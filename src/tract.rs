//! The `Tract` abstraction and its `Init → Start → Wait` lifecycle.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;

use crate::error::InitError;
use crate::input::InputRef;
use crate::output::OutputLink;
use crate::request::RequestWrapper;

/// A pipeline stage (or composition of stages) with one input type and
/// one output type.
///
/// Lifecycle: `init` wires the tract to its input and output and builds
/// whatever the tract needs to run (workers, internal links), returning a
/// [`Starter`]. `Starter::start` launches the tract's tasks and returns a
/// [`Waiter`]; `Waiter::wait` resolves once the tract has drained its
/// input and closed its output. A tract shuts down only when its input
/// reports end-of-stream. `init` may be called again afterwards to run
/// the tract anew.
///
/// Users generally implement [`Worker`](crate::Worker) and build tracts
/// with the constructors in this crate; implementing `Tract` directly is
/// for advanced flow control.
#[async_trait]
pub trait Tract<I, O>: Send + Sync {
  /// Name of the tract, used for logging and instrumentation. Tracts
  /// with an empty name emit no spans or metrics of their own.
  fn name(&self) -> &str;

  /// Wires the tract between `input` and `output`. On error nothing has
  /// started and any resources acquired along the way have been
  /// released.
  async fn init(
    &self,
    input: InputRef<RequestWrapper<I>>,
    output: OutputLink<RequestWrapper<O>>,
  ) -> Result<Starter, InitError>;
}

/// An initialized tract, ready to start. One-shot: starting consumes it.
pub struct Starter {
  start: Box<dyn FnOnce() -> Waiter + Send>,
}

impl Starter {
  pub fn new(start: impl FnOnce() -> Waiter + Send + 'static) -> Self {
    Self { start: Box::new(start) }
  }

  /// Launches the tract's tasks.
  pub fn start(self) -> Waiter {
    (self.start)()
  }
}

/// A running tract. Waiting consumes it and resolves once the tract has
/// finished processing and released its resources.
pub struct Waiter {
  done: BoxFuture<'static, ()>,
}

impl Waiter {
  pub fn new(done: impl Future<Output = ()> + Send + 'static) -> Self {
    Self { done: Box::pin(done) }
  }

  pub async fn wait(self) {
    self.done.await;
  }
}
