//! Initialization errors surfaced by `Tract::init`.

use thiserror::Error;

/// Boxed error used at the worker-factory seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned when a tract (or one of its nested tracts) fails to
/// initialize. Worker rejection and end-of-stream are not errors; a failed
/// init is the only failure mode a pipeline can surface.
#[derive(Debug, Error)]
pub enum InitError {
  /// A worker factory call failed. Workers already built for the same
  /// tract have been closed.
  #[error("failed to make worker[{index}]: {source}")]
  MakeWorker {
    index: usize,
    #[source]
    source: BoxError,
  },

  /// A worker tract was configured with a worker count of zero.
  #[error("worker tract {name:?} requires at least one worker")]
  NoWorkers { name: String },

  /// The head tract of a serial or fan-out group failed to initialize.
  #[error("failed to initialize head tract {name:?}: {source}")]
  Head {
    name: String,
    #[source]
    source: Box<InitError>,
  },

  /// The tail tract of a serial group failed to initialize.
  #[error("failed to initialize tail tract {name:?}: {source}")]
  Tail {
    name: String,
    #[source]
    source: Box<InitError>,
  },

  /// A sibling tract of a parallel group failed to initialize.
  #[error("failed to initialize tract[{index}] {name:?}: {source}")]
  Branch {
    index: usize,
    name: String,
    #[source]
    source: Box<InitError>,
  },

  /// A tail tract of a fan-out group failed to initialize.
  #[error("failed to initialize tail tract[{index}] {name:?}: {source}")]
  FanOutTail {
    index: usize,
    name: String,
    #[source]
    source: Box<InitError>,
  },
}
