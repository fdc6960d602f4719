//! Request wrapper: the user payload plus the per-request observability
//! state that travels with it through the pipeline.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::observe::{Context, Span, SpanRef, ROOT_STAGE};

/// A payload moving through a pipeline, paired with its observability
/// metadata. Workers never see the wrapper; they see the payload and a
/// [`Context`] derived from it.
pub struct RequestWrapper<T> {
  pub(crate) payload: T,
  pub(crate) meta: RequestMeta,
}

impl<T> RequestWrapper<T> {
  pub(crate) fn new(payload: T, meta: RequestMeta) -> Self {
    Self { payload, meta }
  }

  /// The wrapped payload.
  pub fn payload(&self) -> &T {
    &self.payload
  }

  /// The context a worker processing this request would receive.
  pub fn context(&self) -> &Context {
    self.meta.current_context()
  }

  pub(crate) fn into_parts(self) -> (T, RequestMeta) {
    (self.payload, self.meta)
  }

  /// Splits this wrapper into `k` independent clones for fan-out. Every
  /// span currently open on the metadata is ended exactly once, after the
  /// last of the `k` descendant paths ends it.
  pub(crate) fn split(self, k: usize) -> Vec<RequestWrapper<T>>
  where
    T: Clone,
  {
    let (payload, meta) = self.into_parts();
    let metas = meta.split(k);
    let mut clones = Vec::with_capacity(k);
    let mut metas = metas.into_iter();
    for _ in 1..k {
      let meta = metas.next().expect("split produced too few metas");
      clones.push(RequestWrapper::new(payload.clone(), meta));
    }
    if let Some(meta) = metas.next() {
      clones.push(RequestWrapper::new(payload, meta));
    }
    clones
  }
}

/// Deferred span-end action. Cloneable so fan-out clones can share it;
/// `gated` wraps the action in a shared countdown so it fires only when
/// the last holder runs it.
#[derive(Clone)]
pub(crate) struct EndSpan(Arc<dyn Fn() + Send + Sync>);

impl EndSpan {
  pub(crate) fn from_span(span: SpanRef) -> Self {
    Self(Arc::new(move || span.end()))
  }

  pub(crate) fn end(&self) {
    (self.0)()
  }

  /// Returns an action that decrements `gate` and runs the inner action
  /// only on the final decrement. Gates chain across nested fan-outs.
  fn gated(&self, gate: Arc<AtomicI32>) -> Self {
    let inner = self.0.clone();
    Self(Arc::new(move || {
      if gate.fetch_sub(1, Ordering::AcqRel) == 1 {
        inner();
      }
    }))
  }
}

/// One observability unit: the context produced by starting a span, the
/// timestamp captured at push time, and the deferred end of that span.
///
/// Input units are pushed on a stage's `get` and popped on the matching
/// `put`; output units are pushed on `put` and drained on the next `get`.
/// The delta between a unit's timestamp and the moment it is closed is
/// what feeds the work and wait latency measures.
#[derive(Clone)]
pub(crate) struct Unit {
  pub(crate) ctx: Context,
  pub(crate) timestamp: Instant,
  end: EndSpan,
}

impl Unit {
  pub(crate) fn open(parent: &Context, span_name: &str, timestamp: Instant) -> Self {
    let (ctx, span) = parent.start_child(span_name);
    Self { ctx, timestamp, end: EndSpan::from_span(span) }
  }

  fn gated(&self, gate: &Arc<AtomicI32>) -> Self {
    Self { ctx: self.ctx.clone(), timestamp: self.timestamp, end: self.end.gated(gate.clone()) }
  }
}

/// Per-request observability state: the base unit created at the pipeline
/// entry plus the input/output unit stacks maintained by the stage
/// decorators. The stacks replicate the call stack the request would have
/// if the pipeline were a nest of plain function calls, which is what
/// gives spans their parent/child relationships.
pub(crate) struct RequestMeta {
  base: Unit,
  input_stack: Vec<Unit>,
  output_stack: Vec<Unit>,
}

impl RequestMeta {
  /// Opens the base unit for a request entering the pipeline: starts the
  /// root span under `base` and records the entry timestamp.
  pub(crate) fn open(base: &Context, timestamp: Instant) -> Self {
    Self {
      base: Unit::open(base, ROOT_STAGE, timestamp),
      input_stack: Vec::new(),
      output_stack: Vec::new(),
    }
  }

  /// The context of the most recently entered stage, or the base context
  /// when the request is not inside any named stage.
  pub(crate) fn current_context(&self) -> &Context {
    self.input_stack.last().map(|unit| &unit.ctx).unwrap_or(&self.base.ctx)
  }

  /// The context of the base unit (carries the entry tags).
  pub(crate) fn base_context(&self) -> &Context {
    &self.base.ctx
  }

  pub(crate) fn push_input(&mut self, parent: &Context, span_name: &str, timestamp: Instant) {
    self.input_stack.push(Unit::open(parent, span_name, timestamp));
  }

  /// Pops the top input unit, ending its span. Returns the unit's push
  /// timestamp so the caller can record work latency.
  pub(crate) fn pop_input(&mut self) -> Option<Instant> {
    let unit = self.input_stack.pop()?;
    unit.end.end();
    Some(unit.timestamp)
  }

  pub(crate) fn push_output(&mut self, parent: &Context, span_name: &str, timestamp: Instant) {
    self.output_stack.push(Unit::open(parent, span_name, timestamp));
  }

  /// Ends every output unit. Returns the earliest push timestamp so the
  /// caller can record wait latency since the first un-drained put.
  pub(crate) fn drain_outputs(&mut self) -> Option<Instant> {
    let earliest = self.output_stack.first().map(|unit| unit.timestamp);
    for unit in self.output_stack.drain(..) {
      unit.end.end();
    }
    earliest
  }

  /// Splits into `k` metas whose unit stacks are independent copies but
  /// whose span-end actions are shared through per-unit gates initialized
  /// to `k`: each span open at the fork ends exactly once, when the last
  /// descendant path closes it.
  pub(crate) fn split(self, k: usize) -> Vec<RequestMeta> {
    if k == 1 {
      return vec![self];
    }
    let gate = |count: usize| Arc::new(AtomicI32::new(count as i32));
    let base_gate = gate(k);
    let input_gates: Vec<_> = self.input_stack.iter().map(|_| gate(k)).collect();
    let output_gates: Vec<_> = self.output_stack.iter().map(|_| gate(k)).collect();
    (0..k)
      .map(|_| RequestMeta {
        base: self.base.gated(&base_gate),
        input_stack: self
          .input_stack
          .iter()
          .zip(&input_gates)
          .map(|(unit, gate)| unit.gated(gate))
          .collect(),
        output_stack: self
          .output_stack
          .iter()
          .zip(&output_gates)
          .map(|(unit, gate)| unit.gated(gate))
          .collect(),
      })
      .collect()
  }

  /// Ends everything still open on this request: all input units, all
  /// output units, then the base unit. Used by the dead-letter path and
  /// the pipeline exit. Returns the entry timestamp.
  pub(crate) fn finish(mut self) -> Instant {
    while self.pop_input().is_some() {}
    self.drain_outputs();
    self.base.end.end();
    self.base.timestamp
  }
}
