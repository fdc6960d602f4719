//! Input contract: where a tract gets requests from.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_stream::{Stream, StreamExt};

/// A source of requests for a tract.
///
/// Multiple workers (and multiple sibling tracts in a parallel group)
/// share one input, so `get` takes `&self` and implementations serialize
/// internally.
#[async_trait]
pub trait Input<T>: Send + Sync {
  /// Gets the next request. `None` means there are no more requests and
  /// never will be; it is the only termination signal in a pipeline.
  async fn get(&self) -> Option<T>;
}

/// Shared handle to an input.
pub type InputRef<T> = Arc<dyn Input<T>>;

/// Adapts any [`Stream`] into an [`Input`].
pub struct StreamInput<S> {
  stream: Mutex<S>,
}

impl<S> StreamInput<S> {
  pub fn new(stream: S) -> Self {
    Self { stream: Mutex::new(stream) }
  }
}

/// Input yielding the items of an iterator, commonly used to feed a
/// pipeline from a collection.
pub fn iter_input<I>(items: I) -> StreamInput<tokio_stream::Iter<I::IntoIter>>
where
  I: IntoIterator,
{
  StreamInput::new(tokio_stream::iter(items))
}

#[async_trait]
impl<S, T> Input<T> for StreamInput<S>
where
  S: Stream<Item = T> + Unpin + Send,
  T: Send,
{
  async fn get(&self) -> Option<T> {
    self.stream.lock().await.next().await
  }
}
