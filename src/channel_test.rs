//! Tests for `channel`.

use std::sync::Arc;

use crate::channel::Channel;
use crate::input::Input;
use crate::output::Output;

#[tokio::test]
async fn delivers_in_fifo_order() {
  let ch = Channel::new(4);
  ch.put(1).await;
  ch.put(2).await;
  ch.put(3).await;
  ch.close();

  assert_eq!(ch.get().await, Some(1));
  assert_eq!(ch.get().await, Some(2));
  assert_eq!(ch.get().await, Some(3));
  assert_eq!(ch.get().await, None);
}

#[tokio::test]
async fn close_signals_end_of_stream_after_drain() {
  let ch = Channel::new(2);
  ch.put("a").await;
  ch.close();

  assert_eq!(ch.get().await, Some("a"));
  assert_eq!(ch.get().await, None);
  // End-of-stream is sticky.
  assert_eq!(ch.get().await, None);
}

#[tokio::test]
async fn close_is_idempotent_and_put_after_close_is_dropped() {
  let ch = Channel::new(2);
  ch.put(1).await;
  ch.close();
  ch.close();
  ch.put(2).await;

  assert_eq!(ch.get().await, Some(1));
  assert_eq!(ch.get().await, None);
}

#[tokio::test]
async fn get_waits_for_a_put() {
  let ch: Arc<Channel<u32>> = Arc::new(Channel::new(1));
  let consumer = {
    let ch = ch.clone();
    tokio::spawn(async move { ch.get().await })
  };

  ch.put(42).await;
  assert_eq!(consumer.await.expect("consumer task"), Some(42));
}

#[tokio::test]
async fn zero_capacity_is_clamped() {
  let ch = Channel::new(0);
  ch.put(7).await;
  ch.close();
  assert_eq!(ch.get().await, Some(7));
}
