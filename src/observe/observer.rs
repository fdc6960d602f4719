//! The pluggable observability sink: tracer, metric recorder, and the
//! measures/tags the pipeline emits.
//!
//! The pipeline core never talks to a concrete tracing or metrics backend.
//! Everything it emits goes through an [`Observer`], carried on the request
//! context from the pipeline entry onward. The default is [`NoopObserver`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::context::Tag;

/// Metric tag key naming a worker tract stage.
pub const WORKER_NAME_KEY: &str = "worker.name";
/// Metric tag key naming a group tract stage.
pub const GROUP_NAME_KEY: &str = "group.name";
/// Stage name used for the pipeline boundary itself (root span name and
/// the group tag on whole-pipeline work latency).
pub const ROOT_STAGE: &str = "pipeweave/base";

/// Monotonic timestamp source for all latency measurements.
pub(crate) fn now() -> Instant {
  Instant::now()
}

/// One of the eight latency measures the pipeline records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Measure {
  WorkerInput,
  WorkerWait,
  WorkerWork,
  WorkerOutput,
  GroupInput,
  GroupWait,
  GroupWork,
  GroupOutput,
}

impl Measure {
  /// Stable metric path, usable as a series name by exporters.
  pub fn path(self) -> &'static str {
    match self {
      Measure::WorkerInput => "pipeweave/worker/input/latency",
      Measure::WorkerWait => "pipeweave/worker/wait/latency",
      Measure::WorkerWork => "pipeweave/worker/work/latency",
      Measure::WorkerOutput => "pipeweave/worker/output/latency",
      Measure::GroupInput => "pipeweave/group/input/latency",
      Measure::GroupWait => "pipeweave/group/wait/latency",
      Measure::GroupWork => "pipeweave/group/work/latency",
      Measure::GroupOutput => "pipeweave/group/output/latency",
    }
  }
}

/// Whether a stage is a worker tract or a group tract. Selects the measure
/// set and tag key its decorators emit under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageKind {
  Worker,
  Group,
}

impl StageKind {
  pub(crate) fn label(self) -> &'static str {
    match self {
      StageKind::Worker => "worker",
      StageKind::Group => "group",
    }
  }

  pub(crate) fn tag_key(self) -> &'static str {
    match self {
      StageKind::Worker => WORKER_NAME_KEY,
      StageKind::Group => GROUP_NAME_KEY,
    }
  }

  pub(crate) fn input_measure(self) -> Measure {
    match self {
      StageKind::Worker => Measure::WorkerInput,
      StageKind::Group => Measure::GroupInput,
    }
  }

  pub(crate) fn wait_measure(self) -> Measure {
    match self {
      StageKind::Worker => Measure::WorkerWait,
      StageKind::Group => Measure::GroupWait,
    }
  }

  pub(crate) fn work_measure(self) -> Measure {
    match self {
      StageKind::Worker => Measure::WorkerWork,
      StageKind::Group => Measure::GroupWork,
    }
  }

  pub(crate) fn output_measure(self) -> Measure {
    match self {
      StageKind::Worker => Measure::WorkerOutput,
      StageKind::Group => Measure::GroupOutput,
    }
  }
}

/// Span name for the time a request spends inside a stage.
pub(crate) fn work_span_name(kind: StageKind, stage: &str) -> String {
  format!("pipeweave/{}/{}/work", kind.label(), stage)
}

/// Span name for the time a request spends between a stage and the next.
pub(crate) fn wait_span_name(kind: StageKind, stage: &str) -> String {
  format!("pipeweave/{}/{}/wait", kind.label(), stage)
}

/// A started trace span. `end` must be idempotent.
pub trait Span: Send + Sync {
  fn end(&self);

  /// Identifier assigned by the observer that started this span, used to
  /// parent child spans. Observers that do not track identity return 0.
  fn id(&self) -> u64 {
    0
  }
}

pub type SpanRef = Arc<dyn Span>;

/// Observability sink: a tracer plus a metric recorder.
///
/// Implementations must be cheap and non-blocking; they are called on the
/// hot path of every stage boundary.
pub trait Observer: Send + Sync {
  /// Starts a span named `name` as a child of `parent` (or a root span).
  fn start_span(&self, parent: Option<&SpanRef>, name: &str) -> SpanRef;

  /// Records one latency measurement with its tags.
  fn record(&self, measure: Measure, value: Duration, tags: &[Tag]);
}

pub type ObserverRef = Arc<dyn Observer>;

/// Observer that discards everything. The default for contexts created by
/// [`Context::background`](super::Context::background).
#[derive(Debug, Default)]
pub struct NoopObserver;

struct NoopSpan;

impl Span for NoopSpan {
  fn end(&self) {}
}

impl Observer for NoopObserver {
  fn start_span(&self, _parent: Option<&SpanRef>, _name: &str) -> SpanRef {
    Arc::new(NoopSpan)
  }

  fn record(&self, _measure: Measure, _value: Duration, _tags: &[Tag]) {}
}
