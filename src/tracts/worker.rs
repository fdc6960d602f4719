//! Worker tract: runs N parallel worker instances between one input and
//! one output.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::InitError;
use crate::input::{Input, InputRef};
use crate::observe;
use crate::output::{Output, OutputLink};
use crate::request::RequestWrapper;
use crate::tract::{Starter, Tract, Waiter};
use crate::worker::{Worker, WorkerFactory};

/// A tract that applies a user worker to every request, running `size`
/// worker instances concurrently. Instances share the input and output;
/// ordering holds within one instance, not across them.
pub struct WorkerTract<I, O, F> {
  name: String,
  size: usize,
  factory: Arc<F>,
  close_factory: bool,
  _payload: PhantomData<fn(I) -> O>,
}

impl<I, O, F> WorkerTract<I, O, F>
where
  I: Send + 'static,
  O: Send + 'static,
  F: WorkerFactory<I, O>,
{
  pub fn new(name: impl Into<String>, size: usize, factory: F) -> Self {
    Self {
      name: name.into(),
      size,
      factory: Arc::new(factory),
      close_factory: false,
      _payload: PhantomData,
    }
  }

  /// Close the factory once the tract finishes running. Leaves the tract
  /// unusable for a second run; by default the user owns factory
  /// shutdown instead.
  pub fn close_factory(mut self, close: bool) -> Self {
    self.close_factory = close;
    self
  }
}

#[async_trait]
impl<I, O, F> Tract<I, O> for WorkerTract<I, O, F>
where
  I: Send + 'static,
  O: Send + 'static,
  F: WorkerFactory<I, O> + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn init(
    &self,
    input: InputRef<RequestWrapper<I>>,
    output: OutputLink<RequestWrapper<O>>,
  ) -> Result<Starter, InitError> {
    if self.size == 0 {
      return Err(InitError::NoWorkers { name: self.name.clone() });
    }
    let (input, output) = observe::worker_links(&self.name, input, output);

    let mut workers = Vec::with_capacity(self.size);
    for index in 0..self.size {
      match self.factory.make_worker().await {
        Ok(worker) => workers.push(worker),
        Err(source) => {
          // Unwind the workers already built before reporting.
          for mut worker in workers {
            worker.close().await;
          }
          return Err(InitError::MakeWorker { index, source });
        }
      }
    }

    let name = self.name.clone();
    let close_factory = self.close_factory;
    let factory = self.factory.clone();
    Ok(Starter::new(move || {
      let mut handles = Vec::with_capacity(workers.len());
      for (index, worker) in workers.into_iter().enumerate() {
        let name = name.clone();
        let input = input.clone();
        let output = output.clone();
        handles.push(tokio::spawn(run_worker(name, index, worker, input, output)));
      }
      Waiter::new(async move {
        for handle in handles {
          let _ = handle.await;
        }
        output.close();
        if close_factory {
          factory.close();
        }
        trace!(tract = %name, "worker tract finished");
      })
    }))
  }
}

/// One worker instance's loop: get, work, put (or dead-letter on drop),
/// until the input reports end-of-stream.
async fn run_worker<I, O, W>(
  name: String,
  index: usize,
  mut worker: W,
  input: InputRef<RequestWrapper<I>>,
  output: OutputLink<RequestWrapper<O>>,
) where
  I: Send + 'static,
  O: Send + 'static,
  W: Worker<I, O>,
{
  trace!(tract = %name, worker = index, "worker started");
  while let Some(request) = input.get().await {
    let (payload, meta) = request.into_parts();
    let ctx = meta.current_context().clone();
    match worker.work(&ctx, payload).await {
      Ok(out) => output.put(RequestWrapper::new(out, meta)).await,
      Err(error) => {
        // Dead-letter path: the request is discarded, but every span
        // still open on it must be ended.
        debug!(tract = %name, worker = index, %error, "request dropped");
        meta.finish();
      }
    }
  }
  worker.close().await;
  trace!(tract = %name, worker = index, "worker exiting");
}
