//! Pipeline boundary: wraps the user's raw input and output with the
//! request-metadata layer and drives the top tract's lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::InitError;
use crate::input::{Input, InputRef};
use crate::observe::{
  self, Context, Measure, NoopObserver, ObserverRef, Tag, GROUP_NAME_KEY, ROOT_STAGE,
};
use crate::output::{Output, OutputLink, OutputRef};
use crate::request::{RequestMeta, RequestWrapper};
use crate::tract::Tract;

/// Hook refining the base context for each request entering the
/// pipeline. Receives the payload and a seed context already carrying
/// the runner's observer; returns the context to run the request under
/// (tags, deadline).
pub type BaseContextFn<T> = Arc<dyn Fn(&T, Context) -> Context + Send + Sync>;

/// Wraps the user input: every payload gotten is paired with fresh
/// request metadata whose base unit opens the root span.
pub struct EntryInput<T> {
  inner: InputRef<T>,
  observer: ObserverRef,
  base_context: Option<BaseContextFn<T>>,
}

impl<T> EntryInput<T> {
  pub fn new(inner: InputRef<T>, observer: ObserverRef) -> Self {
    Self { inner, observer, base_context: None }
  }

  pub fn with_base_context(mut self, hook: BaseContextFn<T>) -> Self {
    self.base_context = Some(hook);
    self
  }
}

#[async_trait]
impl<T: Send + 'static> Input<RequestWrapper<T>> for EntryInput<T> {
  async fn get(&self) -> Option<RequestWrapper<T>> {
    let payload = self.inner.get().await?;
    let seed = Context::background().with_observer(self.observer.clone());
    let base = match &self.base_context {
      Some(hook) => hook(&payload, seed),
      None => seed,
    };
    let meta = RequestMeta::open(&base, observe::now());
    Some(RequestWrapper::new(payload, meta))
  }
}

/// Wraps the user output: unwraps the payload for the user sink, ends
/// every span still open on the request, and records the whole-pipeline
/// work latency under the root stage name.
pub struct ExitOutput<T> {
  inner: OutputRef<T>,
}

impl<T> ExitOutput<T> {
  pub fn new(inner: OutputRef<T>) -> Self {
    Self { inner }
  }
}

#[async_trait]
impl<T: Send + 'static> Output<RequestWrapper<T>> for ExitOutput<T> {
  async fn put(&self, request: RequestWrapper<T>) {
    let (payload, meta) = request.into_parts();
    let ctx = meta.base_context().clone();
    self.inner.put(payload).await;
    let end = observe::now();
    let entered = meta.finish();
    ctx.record(
      &Tag::new(GROUP_NAME_KEY, ROOT_STAGE),
      &[(Measure::GroupWork, end.saturating_duration_since(entered))],
    );
  }

  fn close(&self) {
    self.inner.close();
  }
}

/// Runs a tract between a user input and output.
///
/// ```no_run
/// # use pipeweave::{func_tract, iter_input, BufferOutput, TractRunner};
/// # async fn demo() {
/// let results = BufferOutput::new();
/// TractRunner::new(
///   iter_input([1.0, 4.0, 9.0]),
///   func_tract("sqrt", 2, f64::sqrt),
///   results.clone(),
/// )
/// .run()
/// .await
/// .expect("init");
/// # }
/// ```
pub struct TractRunner<I, O> {
  input: InputRef<I>,
  tract: Box<dyn Tract<I, O>>,
  output: OutputRef<O>,
  observer: ObserverRef,
  base_context: Option<BaseContextFn<I>>,
}

impl<I, O> TractRunner<I, O>
where
  I: Send + 'static,
  O: Send + 'static,
{
  pub fn new(
    input: impl Input<I> + 'static,
    tract: impl Tract<I, O> + 'static,
    output: impl Output<O> + 'static,
  ) -> Self {
    Self {
      input: Arc::new(input),
      tract: Box::new(tract),
      output: Arc::new(output),
      observer: Arc::new(NoopObserver),
      base_context: None,
    }
  }

  /// Name of the top tract.
  pub fn name(&self) -> &str {
    self.tract.name()
  }

  /// Sets the observability sink spans and metrics are emitted to.
  pub fn with_observer(mut self, observer: ObserverRef) -> Self {
    self.observer = observer;
    self
  }

  /// Sets the per-request base-context hook (tags, deadline).
  pub fn with_base_context(
    mut self,
    hook: impl Fn(&I, Context) -> Context + Send + Sync + 'static,
  ) -> Self {
    self.base_context = Some(Arc::new(hook));
    self
  }

  /// Initializes, starts, and waits out the pipeline. The only failure
  /// is an initialization error; after a successful init the pipeline
  /// runs until the input reports end-of-stream.
  pub async fn run(self) -> Result<(), InitError> {
    let entry = EntryInput {
      inner: self.input,
      observer: self.observer,
      base_context: self.base_context,
    };
    let exit = ExitOutput { inner: self.output };

    debug!(tract = %self.tract.name(), "initializing pipeline");
    let starter = self.tract.init(Arc::new(entry), OutputLink::owned(Arc::new(exit))).await?;
    starter.start().wait().await;
    debug!(tract = %self.tract.name(), "pipeline finished");
    Ok(())
  }
}

/// Runs `tract` between `input` and `output` with default settings.
pub async fn run<I, O>(
  input: impl Input<I> + 'static,
  tract: impl Tract<I, O> + 'static,
  output: impl Output<O> + 'static,
) -> Result<(), InitError>
where
  I: Send + 'static,
  O: Send + 'static,
{
  TractRunner::new(input, tract, output).run().await
}
