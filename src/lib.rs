//! # pipeweave
//!
//! Typed, composable, concurrent dataflow pipelines on tokio.
//!
//! A pipeline is a [`Tract`]: a stage typed on its input and output.
//! Worker tracts run N instances of a user [`Worker`] between an input
//! and an output; serial, parallel, and fan-out groups compose tracts
//! into larger tracts. Stages are connected by bounded [`Channel`]s, and
//! per-request latency metrics and hierarchical trace spans are woven
//! through every named stage via a pluggable [`Observer`].
//!
//! ```no_run
//! use pipeweave::{func_tract, iter_input, run, BufferOutput};
//!
//! # async fn demo() {
//! let results = BufferOutput::new();
//! run(
//!   iter_input([0.0, 1.0, 4.0, 9.0]),
//!   func_tract("sqrt", 4, f64::sqrt),
//!   results.clone(),
//! )
//! .await
//! .expect("pipeline init");
//! # }
//! ```
//!
//! Shutdown is driven entirely by end-of-stream on the input side: when
//! the user input is exhausted, each stage drains, closes its downstream
//! link, and the whole composition winds down in order.

pub mod channel;
pub mod error;
pub mod input;
pub mod observe;
pub mod output;
pub mod request;
pub mod runner;
pub mod tract;
pub mod tracts;
pub mod worker;

#[cfg(test)]
mod channel_test;
#[cfg(test)]
mod output_test;
#[cfg(test)]
mod request_test;
#[cfg(test)]
mod worker_test;

pub use channel::{Channel, DEFAULT_CAPACITY};
pub use error::{BoxError, InitError};
pub use input::{iter_input, Input, InputRef, StreamInput};
pub use observe::{
  Context, Measure, MetricPoint, NoopObserver, Observer, ObserverRef, RecordingObserver, Span,
  SpanRecord, SpanRef, StageKind, Summary, Tag, GROUP_NAME_KEY, ROOT_STAGE, WORKER_NAME_KEY,
};
pub use output::{BufferOutput, DiscardOutput, Output, OutputLink, OutputRef};
pub use request::RequestWrapper;
pub use runner::{run, BaseContextFn, EntryInput, ExitOutput, TractRunner};
pub use tract::{Starter, Tract, Waiter};
pub use tracts::{
  fan_out, func_tract, parallel, serial, try_func_tract, worker_tract, worker_tract_from,
  FanOutGroupTract, Linker, ParallelGroupTract, SerialGroupTract, WorkerTract,
};
pub use worker::{CloneFactory, FnWorker, TryFnWorker, Worker, WorkerFactory};
