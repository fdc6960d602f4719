//! Tests for `request`: metadata stacks and fan-out span-end accounting.

use std::sync::Arc;
use std::time::Duration;

use crate::observe::{self, Context, RecordingObserver, Span};
use crate::request::RequestMeta;

fn recording_base() -> (Arc<RecordingObserver>, Context) {
  let observer = Arc::new(RecordingObserver::new());
  let base = Context::background().with_observer(observer.clone());
  (observer, base)
}

#[test]
fn open_starts_the_root_span() {
  let (observer, base) = recording_base();
  let meta = RequestMeta::open(&base, observe::now());

  let spans = observer.spans();
  assert_eq!(spans.len(), 1);
  assert_eq!(spans[0].name, observe::ROOT_STAGE);
  assert_eq!(spans[0].parent, None);
  assert_eq!(spans[0].ends, 0);

  meta.finish();
  assert_eq!(observer.spans()[0].ends, 1);
}

#[test]
fn current_context_is_topmost_input_unit_else_base() {
  let (_observer, base) = recording_base();
  let mut meta = RequestMeta::open(&base, observe::now());
  let base_span_id = meta.current_context().span().expect("base span").id();

  let ctx = meta.current_context().clone();
  meta.push_input(&ctx, "stage-a/work", observe::now());
  let top_span_id = meta.current_context().span().expect("unit span").id();
  assert_ne!(base_span_id, top_span_id);

  meta.pop_input();
  assert_eq!(meta.current_context().span().expect("base span").id(), base_span_id);
  meta.finish();
}

#[test]
fn pop_input_ends_the_unit_span_and_returns_its_timestamp() {
  let (observer, base) = recording_base();
  let mut meta = RequestMeta::open(&base, observe::now());

  let pushed_at = observe::now();
  let ctx = meta.current_context().clone();
  meta.push_input(&ctx, "stage/work", pushed_at);
  assert_eq!(meta.pop_input(), Some(pushed_at));
  assert_eq!(meta.pop_input(), None);

  let spans = observer.spans_named("stage/work");
  assert_eq!(spans.len(), 1);
  assert_eq!(spans[0].ends, 1);
  meta.finish();
}

#[test]
fn drain_outputs_ends_every_unit_and_returns_the_earliest_timestamp() {
  let (observer, base) = recording_base();
  let mut meta = RequestMeta::open(&base, observe::now());

  let first = observe::now();
  let second = first + Duration::from_millis(5);
  let ctx = meta.current_context().clone();
  meta.push_output(&ctx, "stage-a/wait", first);
  meta.push_output(&ctx, "stage-b/wait", second);

  assert_eq!(meta.drain_outputs(), Some(first));
  assert_eq!(meta.drain_outputs(), None);
  assert_eq!(observer.spans_named("stage-a/wait")[0].ends, 1);
  assert_eq!(observer.spans_named("stage-b/wait")[0].ends, 1);
  meta.finish();
}

#[test]
fn finish_ends_everything_still_open() {
  let (observer, base) = recording_base();
  let mut meta = RequestMeta::open(&base, observe::now());
  let ctx = meta.current_context().clone();
  meta.push_input(&ctx, "stage/work", observe::now());
  meta.push_output(&ctx, "stage/wait", observe::now());

  meta.finish();
  assert!(observer.open_spans().is_empty(), "finish must leave no dangling spans");
}

#[test]
fn split_shares_span_ends_until_the_last_clone() {
  let (observer, base) = recording_base();
  let mut meta = RequestMeta::open(&base, observe::now());
  let ctx = meta.current_context().clone();
  meta.push_input(&ctx, "stage/work", observe::now());

  let mut clones = meta.split(3);
  assert_eq!(clones.len(), 3);

  clones.pop().expect("clone").finish();
  clones.pop().expect("clone").finish();
  // Two of three paths have finished: nothing may have ended yet.
  assert!(observer.spans().iter().all(|s| s.ends == 0), "spans ended before the last path");

  clones.pop().expect("clone").finish();
  assert!(observer.spans().iter().all(|s| s.ends == 1), "every span ends exactly once");
}

#[test]
fn nested_splits_chain_their_gates() {
  let (observer, base) = recording_base();
  let meta = RequestMeta::open(&base, observe::now());

  let mut first = meta.split(2);
  let left = first.remove(0);
  let right = first.remove(0);

  // Split one branch again: the root span now has three ultimate holders.
  let mut second = left.split(2);
  second.remove(0).finish();
  second.remove(0).finish();
  assert_eq!(observer.spans()[0].ends, 0, "right branch still holds the root span");

  right.finish();
  assert_eq!(observer.spans()[0].ends, 1);
}

#[test]
fn split_of_one_is_the_identity() {
  let (observer, base) = recording_base();
  let meta = RequestMeta::open(&base, observe::now());
  let mut clones = meta.split(1);
  assert_eq!(clones.len(), 1);
  clones.remove(0).finish();
  assert_eq!(observer.spans()[0].ends, 1);
}
