//! Tests for `output`.

use std::sync::Arc;

use crate::channel::Channel;
use crate::input::Input;
use crate::observe::{self, Context};
use crate::output::{BufferOutput, MultiOutput, Output, OutputLink, OutputRef};
use crate::request::{RequestMeta, RequestWrapper};

#[tokio::test]
async fn shared_link_never_closes_the_output() {
  let ch: Arc<Channel<u32>> = Arc::new(Channel::new(2));
  let owned = OutputLink::owned(ch.clone() as OutputRef<u32>);
  let shared = owned.shared();

  shared.put(1).await;
  shared.close();
  // The shared view's close is a no-op: the channel still accepts puts.
  owned.put(2).await;
  owned.close();

  assert_eq!(ch.get().await, Some(1));
  assert_eq!(ch.get().await, Some(2));
  assert_eq!(ch.get().await, None);
}

#[tokio::test]
async fn owned_link_closes_the_output() {
  let ch: Arc<Channel<u32>> = Arc::new(Channel::new(2));
  let owned = OutputLink::owned(ch.clone() as OutputRef<u32>);
  owned.close();
  assert_eq!(ch.get().await, None);
}

#[tokio::test]
async fn buffer_output_collects_and_shares_across_clones() {
  let buffer = BufferOutput::new();
  let clone = buffer.clone();
  buffer.put(1).await;
  clone.put(2).await;
  clone.close();

  assert_eq!(buffer.len(), 2);
  assert_eq!(buffer.take(), vec![1, 2]);
  assert!(buffer.is_empty());
}

#[tokio::test]
async fn multi_output_delivers_one_clone_per_link() {
  let channels: Vec<Arc<Channel<RequestWrapper<u32>>>> =
    (0..3).map(|_| Arc::new(Channel::new(2))).collect();
  let multi = MultiOutput::new(
    channels.iter().map(|ch| OutputLink::owned(ch.clone() as OutputRef<_>)).collect(),
  );

  let meta = RequestMeta::open(&Context::background(), observe::now());
  multi.put(RequestWrapper::new(7u32, meta)).await;
  multi.close();

  for ch in &channels {
    let request = ch.get().await.expect("one clone per link");
    assert_eq!(*request.payload(), 7);
    assert_eq!(ch.get().await.map(|r| *r.payload()), None);
  }
}
