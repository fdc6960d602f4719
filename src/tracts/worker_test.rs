//! Tests for the worker tract.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BoxError, InitError};
use crate::input::iter_input;
use crate::observe::Context;
use crate::output::BufferOutput;
use crate::runner::run;
use crate::tracts::{func_tract, try_func_tract, worker_tract};
use crate::worker::{Worker, WorkerFactory};

#[derive(Clone)]
struct CountingWorker {
  closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Worker<u32, u32> for CountingWorker {
  type Error = std::convert::Infallible;

  async fn work(&mut self, _ctx: &Context, input: u32) -> Result<u32, Self::Error> {
    Ok(input)
  }

  async fn close(&mut self) {
    self.closed.fetch_add(1, Ordering::SeqCst);
  }
}

struct FlakyFactory {
  made: AtomicUsize,
  fail_at: usize,
  closed: Arc<AtomicUsize>,
}

impl FlakyFactory {
  fn new(fail_at: usize, closed: Arc<AtomicUsize>) -> Self {
    Self { made: AtomicUsize::new(0), fail_at, closed }
  }
}

#[async_trait]
impl WorkerFactory<u32, u32> for FlakyFactory {
  type Worker = CountingWorker;

  async fn make_worker(&self) -> Result<CountingWorker, BoxError> {
    let n = self.made.fetch_add(1, Ordering::SeqCst);
    if n == self.fail_at {
      return Err("connection refused".into());
    }
    Ok(CountingWorker { closed: self.closed.clone() })
  }
}

#[tokio::test]
async fn applies_the_worker_to_every_request() {
  let results = BufferOutput::new();
  run(iter_input(1u32..=10), func_tract("double", 3, |x: u32| x * 2), results.clone())
    .await
    .expect("init");

  let mut doubled = results.take();
  doubled.sort_unstable();
  assert_eq!(doubled, (1u32..=10).map(|x| x * 2).collect::<Vec<_>>());
}

#[tokio::test]
async fn single_worker_preserves_input_order() {
  let results = BufferOutput::new();
  run(iter_input(1u32..=50), func_tract("id", 1, |x: u32| x), results.clone())
    .await
    .expect("init");

  assert_eq!(results.take(), (1u32..=50).collect::<Vec<_>>());
}

#[tokio::test]
async fn dropped_requests_never_reach_the_output() {
  let results = BufferOutput::new();
  run(
    iter_input(1u32..=10),
    try_func_tract("evens", 2, |_ctx: &Context, x: u32| {
      if x % 2 == 0 {
        Ok(x)
      } else {
        Err("odd")
      }
    }),
    results.clone(),
  )
  .await
  .expect("init");

  let mut evens = results.take();
  evens.sort_unstable();
  assert_eq!(evens, vec![2, 4, 6, 8, 10]);
}

#[tokio::test]
async fn workers_are_closed_after_the_run() {
  let closed = Arc::new(AtomicUsize::new(0));
  let results = BufferOutput::new();
  run(
    iter_input(1u32..=5),
    worker_tract("count", 3, FlakyFactory::new(usize::MAX, closed.clone())),
    results.clone(),
  )
  .await
  .expect("init");

  assert_eq!(closed.load(Ordering::SeqCst), 3);
  assert_eq!(results.len(), 5);
}

#[tokio::test]
async fn factory_failure_unwinds_the_workers_already_built() {
  let closed = Arc::new(AtomicUsize::new(0));
  let results: BufferOutput<u32> = BufferOutput::new();
  let err = run(
    iter_input(1u32..=5),
    worker_tract("flaky", 4, FlakyFactory::new(2, closed.clone())),
    results.clone(),
  )
  .await
  .expect_err("factory failure must abort init");

  match &err {
    InitError::MakeWorker { index, .. } => assert_eq!(*index, 2),
    other => panic!("unexpected error: {other}"),
  }
  assert!(err.to_string().contains("worker[2]"));
  assert_eq!(closed.load(Ordering::SeqCst), 2, "the two built workers are closed");
  assert!(results.is_empty());
}

#[tokio::test]
async fn zero_workers_is_an_init_error() {
  let results: BufferOutput<u32> = BufferOutput::new();
  let err = run(iter_input(1u32..=5), func_tract("none", 0, |x: u32| x), results.clone())
    .await
    .expect_err("zero workers");
  assert!(matches!(err, InitError::NoWorkers { .. }));
}
