//! Tests for `worker` adapters and the factory protocol.

use std::time::{Duration, Instant};

use crate::observe::Context;
use crate::worker::{CloneFactory, FnWorker, TryFnWorker, Worker, WorkerFactory};

#[tokio::test]
async fn fn_worker_applies_the_function() {
  let mut worker = FnWorker::new(|x: u32| x * 2);
  let out = worker.work(&Context::background(), 21).await;
  assert_eq!(out, Ok(42));
}

#[tokio::test]
async fn try_fn_worker_propagates_the_drop_decision() {
  let mut worker = TryFnWorker::new(|_ctx: &Context, x: u32| {
    if x % 2 == 0 {
      Ok(x)
    } else {
      Err("odd input")
    }
  });

  assert_eq!(worker.work(&Context::background(), 4).await, Ok(4));
  assert_eq!(worker.work(&Context::background(), 5).await, Err("odd input"));
}

#[tokio::test]
async fn try_fn_worker_sees_the_context_deadline() {
  let deadline = Instant::now() + Duration::from_secs(60);
  let ctx = Context::background().with_deadline(deadline);
  let mut worker =
    TryFnWorker::new(|ctx: &Context, x: u32| -> Result<u32, &'static str> {
      assert!(!ctx.is_expired());
      assert_eq!(ctx.deadline(), Some(deadline));
      Ok(x)
    });

  assert_eq!(worker.work(&ctx, 1).await, Ok(1));
}

#[derive(Clone)]
struct PlusOne;

#[async_trait::async_trait]
impl Worker<u32, u32> for PlusOne {
  type Error = std::convert::Infallible;

  async fn work(&mut self, _ctx: &Context, input: u32) -> Result<u32, Self::Error> {
    Ok(input + 1)
  }
}

#[tokio::test]
async fn clone_factory_hands_out_independent_workers() {
  let factory = CloneFactory::new(PlusOne);
  let mut a = factory.make_worker().await.expect("worker");
  let mut b = factory.make_worker().await.expect("worker");

  assert_eq!(a.work(&Context::background(), 1).await, Ok(2));
  assert_eq!(b.work(&Context::background(), 2).await, Ok(3));
}
