//! Stage decorators: wrap a tract's input and output with latency
//! recording and span start/end around each `get`/`put`.
//!
//! The decorators are stateless; all per-request state lives on the
//! request's metadata stacks. They are installed by `worker_links` /
//! `group_links` only when the tract has a non-empty name.

use std::sync::Arc;

use async_trait::async_trait;

use crate::input::{Input, InputRef};
use crate::output::{Output, OutputLink};
use crate::request::RequestWrapper;

use super::context::Tag;
use super::observer::{now, wait_span_name, work_span_name, StageKind};

struct Stage {
  kind: StageKind,
  tag: Tag,
  work_span: String,
  wait_span: String,
}

impl Stage {
  fn new(kind: StageKind, name: &str) -> Self {
    Self {
      kind,
      tag: Tag::new(kind.tag_key(), name),
      work_span: work_span_name(kind, name),
      wait_span: wait_span_name(kind, name),
    }
  }
}

/// Wraps a worker tract's boundaries. No-op when `name` is empty.
pub(crate) fn worker_links<I, O>(
  name: &str,
  input: InputRef<RequestWrapper<I>>,
  output: OutputLink<RequestWrapper<O>>,
) -> (InputRef<RequestWrapper<I>>, OutputLink<RequestWrapper<O>>)
where
  I: Send + 'static,
  O: Send + 'static,
{
  stage_links(StageKind::Worker, name, input, output)
}

/// Wraps a group tract's boundaries. No-op when `name` is empty.
pub(crate) fn group_links<I, O>(
  name: &str,
  input: InputRef<RequestWrapper<I>>,
  output: OutputLink<RequestWrapper<O>>,
) -> (InputRef<RequestWrapper<I>>, OutputLink<RequestWrapper<O>>)
where
  I: Send + 'static,
  O: Send + 'static,
{
  stage_links(StageKind::Group, name, input, output)
}

fn stage_links<I, O>(
  kind: StageKind,
  name: &str,
  input: InputRef<RequestWrapper<I>>,
  output: OutputLink<RequestWrapper<O>>,
) -> (InputRef<RequestWrapper<I>>, OutputLink<RequestWrapper<O>>)
where
  I: Send + 'static,
  O: Send + 'static,
{
  if name.is_empty() {
    return (input, output);
  }
  (
    Arc::new(ObservedInput { stage: Stage::new(kind, name), inner: input }),
    OutputLink::owned(Arc::new(ObservedOutput { stage: Stage::new(kind, name), inner: output })),
  )
}

/// Input decorator: records input latency, drains pending output units
/// into wait latency, and opens this stage's work span.
pub(crate) struct ObservedInput<T> {
  stage: Stage,
  inner: InputRef<RequestWrapper<T>>,
}

#[async_trait]
impl<T: Send + 'static> Input<RequestWrapper<T>> for ObservedInput<T> {
  async fn get(&self) -> Option<RequestWrapper<T>> {
    let start = now();
    let mut request = self.inner.get().await?;
    let end = now();

    let ctx = request.meta.current_context().clone();
    let mut measures = vec![(self.stage.kind.input_measure(), end - start)];
    // Wait latency runs from the first un-drained upstream put to now.
    if let Some(put_at) = request.meta.drain_outputs() {
      measures.push((self.stage.kind.wait_measure(), end.saturating_duration_since(put_at)));
    }
    ctx.record(&self.stage.tag, &measures);
    request.meta.push_input(&ctx, &self.stage.work_span, end);
    Some(request)
  }
}

/// Output decorator: closes this stage's work span, opens its wait span,
/// and records work and output latency.
pub(crate) struct ObservedOutput<T> {
  stage: Stage,
  inner: OutputLink<RequestWrapper<T>>,
}

#[async_trait]
impl<T: Send + 'static> Output<RequestWrapper<T>> for ObservedOutput<T> {
  async fn put(&self, mut request: RequestWrapper<T>) {
    // Pop strictly before reading the context: the pop changes which
    // context is current.
    let work_started = request.meta.pop_input();
    let ctx = request.meta.current_context().clone();
    let start = now();
    request.meta.push_output(&ctx, &self.stage.wait_span, start);
    self.inner.put(request).await;
    let end = now();
    // The request may already be on a downstream thread; it must not be
    // touched past this point. Record from the values gathered above.
    let mut measures = vec![(self.stage.kind.output_measure(), end - start)];
    if let Some(got_at) = work_started {
      measures.push((self.stage.kind.work_measure(), start.saturating_duration_since(got_at)));
    }
    ctx.record(&self.stage.tag, &measures);
  }

  fn close(&self) {
    self.inner.close();
  }
}
