//! Explicit request context passed to workers.
//!
//! Replaces an ambient context: the observer handle, the current trace
//! span, user tags, and an optional deadline all travel on the request
//! itself. Cloning is cheap (one `Arc` bump).

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::observer::{Measure, NoopObserver, Observer, ObserverRef, SpanRef};

/// One metric tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tag {
  pub key: String,
  pub value: String,
}

impl Tag {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self { key: key.into(), value: value.into() }
  }
}

/// Context visible to a worker while it processes one request.
///
/// Carries the observability sink, the span the worker is running under,
/// any tags the pipeline entry attached, and an optional deadline. The
/// deadline only signals the worker; the pipeline never aborts in-flight
/// work on its own.
#[derive(Clone)]
pub struct Context {
  inner: Arc<ContextInner>,
}

struct ContextInner {
  observer: ObserverRef,
  span: Option<SpanRef>,
  tags: Vec<Tag>,
  deadline: Option<Instant>,
}

impl Context {
  /// An empty context with the no-op observer.
  pub fn background() -> Self {
    Self::with_observer_ref(Arc::new(NoopObserver))
  }

  fn with_observer_ref(observer: ObserverRef) -> Self {
    Self {
      inner: Arc::new(ContextInner { observer, span: None, tags: Vec::new(), deadline: None }),
    }
  }

  /// Returns a context using `observer` for spans and metrics, keeping
  /// span, tags, and deadline.
  pub fn with_observer(&self, observer: ObserverRef) -> Self {
    self.derive(|inner| inner.observer = observer)
  }

  /// Returns a context with `tag` appended. Tags are attached to every
  /// metric recorded downstream of this context.
  pub fn with_tag(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
    let tag = Tag::new(key, value);
    self.derive(|inner| inner.tags.push(tag))
  }

  /// Returns a context carrying a deadline for workers to observe.
  pub fn with_deadline(&self, deadline: Instant) -> Self {
    self.derive(|inner| inner.deadline = Some(deadline))
  }

  fn derive(&self, apply: impl FnOnce(&mut ContextInner)) -> Self {
    let mut inner = ContextInner {
      observer: self.inner.observer.clone(),
      span: self.inner.span.clone(),
      tags: self.inner.tags.clone(),
      deadline: self.inner.deadline,
    };
    apply(&mut inner);
    Self { inner: Arc::new(inner) }
  }

  /// Starts a child span of this context's span and returns the derived
  /// context together with the new span.
  pub fn start_child(&self, name: &str) -> (Context, SpanRef) {
    let span = self.inner.observer.start_span(self.inner.span.as_ref(), name);
    let ctx = self.derive(|inner| inner.span = Some(span.clone()));
    (ctx, span)
  }

  /// The span this context is running under, if any.
  pub fn span(&self) -> Option<&SpanRef> {
    self.inner.span.as_ref()
  }

  /// Tags attached at the pipeline entry.
  pub fn tags(&self) -> &[Tag] {
    &self.inner.tags
  }

  /// Deadline attached at the pipeline entry, if any.
  pub fn deadline(&self) -> Option<Instant> {
    self.inner.deadline
  }

  /// Time remaining until the deadline. `None` when no deadline is set.
  pub fn remaining(&self) -> Option<Duration> {
    self.inner.deadline.map(|d| d.saturating_duration_since(Instant::now()))
  }

  /// Whether the deadline has passed.
  pub fn is_expired(&self) -> bool {
    self.inner.deadline.is_some_and(|d| d <= Instant::now())
  }

  /// Records measurements tagged with `stage_tag` plus this context's tags.
  pub(crate) fn record(&self, stage_tag: &Tag, measures: &[(Measure, Duration)]) {
    let mut tags = Vec::with_capacity(1 + self.inner.tags.len());
    tags.push(stage_tag.clone());
    tags.extend(self.inner.tags.iter().cloned());
    for (measure, value) in measures {
      self.inner.observer.record(*measure, *value, &tags);
    }
  }
}

impl std::fmt::Debug for Context {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Context")
      .field("span", &self.inner.span.as_ref().map(|s| s.id()))
      .field("tags", &self.inner.tags)
      .field("deadline", &self.inner.deadline)
      .finish()
  }
}
