//! Observability woven through every stage: explicit request contexts,
//! the pluggable observer sink, stage decorators, and an in-memory
//! recording observer.

mod context;
mod observer;
mod recording;
mod stage;


pub use context::{Context, Tag};
pub use observer::{
  Measure, NoopObserver, Observer, ObserverRef, Span, SpanRef, StageKind, GROUP_NAME_KEY,
  ROOT_STAGE, WORKER_NAME_KEY,
};
pub use recording::{MetricPoint, RecordingObserver, SpanRecord, Summary};

pub(crate) use observer::now;
pub(crate) use stage::{group_links, worker_links};
