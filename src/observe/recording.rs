//! In-memory observer for tests, demos, and local inspection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use super::context::Tag;
use super::observer::{Measure, Observer, Span, SpanRef};

/// Observer that keeps every span and metric point in memory.
///
/// Span identity and parentage are tracked so tests can assert the span
/// tree; `end` calls are counted so tests can assert each span is ended
/// exactly once.
#[derive(Default)]
pub struct RecordingObserver {
  state: Arc<Mutex<RecordingState>>,
  next_id: AtomicU64,
}

#[derive(Default)]
struct RecordingState {
  spans: Vec<SpanRecord>,
  points: Vec<MetricPoint>,
}

/// Snapshot of one recorded span.
#[derive(Clone, Debug, Serialize)]
pub struct SpanRecord {
  pub id: u64,
  pub parent: Option<u64>,
  pub name: String,
  /// Number of `end` calls observed. The pipeline ends every span it
  /// starts exactly once.
  pub ends: u64,
}

/// Snapshot of one recorded measurement.
#[derive(Clone, Debug, Serialize)]
pub struct MetricPoint {
  pub measure: Measure,
  pub tags: Vec<Tag>,
  pub millis: f64,
}

/// Serializable dump of everything the observer saw.
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
  pub spans: Vec<SpanRecord>,
  pub points: Vec<MetricPoint>,
}

struct RecordedSpan {
  id: u64,
  state: Arc<Mutex<RecordingState>>,
}

impl Span for RecordedSpan {
  fn end(&self) {
    let mut state = self.state.lock().expect("recording state poisoned");
    if let Some(record) = state.spans.iter_mut().find(|s| s.id == self.id) {
      record.ends += 1;
    }
  }

  fn id(&self) -> u64 {
    self.id
  }
}

impl RecordingObserver {
  pub fn new() -> Self {
    Self::default()
  }

  /// All spans started so far, in start order.
  pub fn spans(&self) -> Vec<SpanRecord> {
    self.state.lock().expect("recording state poisoned").spans.clone()
  }

  /// Spans that have not been ended yet.
  pub fn open_spans(&self) -> Vec<SpanRecord> {
    self.spans().into_iter().filter(|s| s.ends == 0).collect()
  }

  /// All metric points recorded so far.
  pub fn points(&self) -> Vec<MetricPoint> {
    self.state.lock().expect("recording state poisoned").points.clone()
  }

  /// Number of points for `measure` carrying every tag in `tags`.
  pub fn metric_count(&self, measure: Measure, tags: &[Tag]) -> usize {
    self
      .points()
      .into_iter()
      .filter(|p| p.measure == measure && tags.iter().all(|t| p.tags.contains(t)))
      .count()
  }

  /// The spans with the given name.
  pub fn spans_named(&self, name: &str) -> Vec<SpanRecord> {
    self.spans().into_iter().filter(|s| s.name == name).collect()
  }

  pub fn summary(&self) -> Summary {
    let state = self.state.lock().expect("recording state poisoned");
    Summary { spans: state.spans.clone(), points: state.points.clone() }
  }
}

impl Observer for RecordingObserver {
  fn start_span(&self, parent: Option<&SpanRef>, name: &str) -> SpanRef {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
    let record = SpanRecord { id, parent: parent.map(|p| p.id()), name: name.to_string(), ends: 0 };
    self.state.lock().expect("recording state poisoned").spans.push(record);
    Arc::new(RecordedSpan { id, state: self.state.clone() })
  }

  fn record(&self, measure: Measure, value: Duration, tags: &[Tag]) {
    let point =
      MetricPoint { measure, tags: tags.to_vec(), millis: value.as_secs_f64() * 1000.0 };
    self.state.lock().expect("recording state poisoned").points.push(point);
  }
}
