//! Bounded FIFO link between stages, implementing both [`Input`] and
//! [`Output`].

use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;

use async_trait::async_trait;

use crate::input::Input;
use crate::output::Output;

/// Buffer size used for the internal links composites create between
/// their stages.
pub const DEFAULT_CAPACITY: usize = 16;

/// A bounded channel of requests. The standard link between stages:
/// producers `put` (blocking when full) until the single closer calls
/// `close`; consumers `get` until they observe end-of-stream.
pub struct Channel<T> {
  tx: std::sync::Mutex<Option<mpsc::Sender<T>>>,
  rx: AsyncMutex<mpsc::Receiver<T>>,
}

impl<T: Send> Channel<T> {
  /// Creates a channel with room for `capacity` in-flight requests
  /// (minimum 1).
  pub fn new(capacity: usize) -> Self {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    Self { tx: std::sync::Mutex::new(Some(tx)), rx: AsyncMutex::new(rx) }
  }
}

impl<T: Send> Default for Channel<T> {
  fn default() -> Self {
    Self::new(DEFAULT_CAPACITY)
  }
}

#[async_trait]
impl<T: Send> Input<T> for Channel<T> {
  async fn get(&self) -> Option<T> {
    self.rx.lock().await.recv().await
  }
}

#[async_trait]
impl<T: Send> Output<T> for Channel<T> {
  async fn put(&self, request: T) {
    let tx = self.tx.lock().expect("channel sender poisoned").clone();
    match tx {
      Some(tx) => {
        if tx.send(request).await.is_err() {
          // Receiver gone while senders remain: a composition bug.
          tracing::error!("put on a channel whose receiver was dropped");
        }
      }
      None => tracing::error!("put on a closed channel"),
    }
  }

  fn close(&self) {
    self.tx.lock().expect("channel sender poisoned").take();
  }
}
