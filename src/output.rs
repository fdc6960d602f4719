//! Output contract: where a tract passes requests along, plus the
//! ownership-tagged link composites use to share one output between
//! multiple writers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::request::RequestWrapper;

/// A sink for requests leaving a tract.
#[async_trait]
pub trait Output<T>: Send + Sync {
  /// Outputs the request. Must not be called after `close`.
  async fn put(&self, request: T);

  /// Closes the output: no more requests will be put. Whatever is on the
  /// other side observes end-of-stream.
  fn close(&self);
}

/// Shared handle to an output.
pub type OutputRef<T> = Arc<dyn Output<T>>;

/// An output handle tagged with close ownership.
///
/// When several writers share one output (parallel siblings, fan-out
/// tails), each writer holds a `Shared` view whose `close` is a no-op;
/// the composite keeps the `Owned` link and closes it exactly once after
/// every writer has finished.
pub enum OutputLink<T> {
  Owned(OutputRef<T>),
  Shared(OutputRef<T>),
}

impl<T> OutputLink<T> {
  pub fn owned(output: OutputRef<T>) -> Self {
    OutputLink::Owned(output)
  }

  /// A non-closing view of the same output.
  pub fn shared(&self) -> Self {
    match self {
      OutputLink::Owned(output) | OutputLink::Shared(output) => {
        OutputLink::Shared(output.clone())
      }
    }
  }
}

impl<T> Clone for OutputLink<T> {
  fn clone(&self) -> Self {
    match self {
      OutputLink::Owned(output) => OutputLink::Owned(output.clone()),
      OutputLink::Shared(output) => OutputLink::Shared(output.clone()),
    }
  }
}

#[async_trait]
impl<T: Send + 'static> Output<T> for OutputLink<T> {
  async fn put(&self, request: T) {
    match self {
      OutputLink::Owned(output) | OutputLink::Shared(output) => output.put(request).await,
    }
  }

  fn close(&self) {
    match self {
      OutputLink::Owned(output) => output.close(),
      OutputLink::Shared(_) => {}
    }
  }
}

/// Terminal sink that discards every request.
#[derive(Debug, Default)]
pub struct DiscardOutput;

#[async_trait]
impl<T: Send + 'static> Output<T> for DiscardOutput {
  async fn put(&self, _request: T) {}

  fn close(&self) {}
}

/// Sink that collects requests into a shared buffer. Clones share the
/// same buffer; the standard leaf sink for tests and demos.
pub struct BufferOutput<T> {
  items: Arc<Mutex<Vec<T>>>,
}

impl<T> BufferOutput<T> {
  pub fn new() -> Self {
    Self { items: Arc::new(Mutex::new(Vec::new())) }
  }

  /// Drains and returns everything collected so far.
  pub fn take(&self) -> Vec<T> {
    std::mem::take(&mut *self.items.lock().expect("buffer poisoned"))
  }

  pub fn len(&self) -> usize {
    self.items.lock().expect("buffer poisoned").len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<T> Default for BufferOutput<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Clone for BufferOutput<T> {
  fn clone(&self) -> Self {
    Self { items: self.items.clone() }
  }
}

#[async_trait]
impl<T: Send + 'static> Output<T> for BufferOutput<T> {
  async fn put(&self, request: T) {
    self.items.lock().expect("buffer poisoned").push(request);
  }

  fn close(&self) {}
}

/// Fan-out head output: every `put` emits one independent clone of the
/// wrapper per underlying link, with span-end accounting shared across
/// the clones (see `RequestMeta::split`). Closing closes every link.
pub(crate) struct MultiOutput<T> {
  links: Vec<OutputLink<RequestWrapper<T>>>,
}

impl<T> MultiOutput<T> {
  pub(crate) fn new(links: Vec<OutputLink<RequestWrapper<T>>>) -> Self {
    Self { links }
  }
}

#[async_trait]
impl<T: Clone + Send + 'static> Output<RequestWrapper<T>> for MultiOutput<T> {
  async fn put(&self, request: RequestWrapper<T>) {
    if self.links.is_empty() {
      let (_, meta) = request.into_parts();
      meta.finish();
      return;
    }
    let clones = request.split(self.links.len());
    for (link, clone) in self.links.iter().zip(clones) {
      link.put(clone).await;
    }
  }

  fn close(&self) {
    for link in &self.links {
      link.close();
    }
  }
}
