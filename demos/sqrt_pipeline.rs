//! Run a sqrt pipeline and dump what the recording observer saw.
//!
//! Set RUST_LOG=pipeweave=trace to watch requests move between workers.

use std::sync::Arc;

use pipeweave::{func_tract, iter_input, serial, BufferOutput, RecordingObserver, TractRunner};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let input = vec![0.0f64, 1.0, 4.0, 9.0, 16.0, 25.0, 36.0, 49.0, 64.0, 81.0, 100.0];
  let observer = Arc::new(RecordingObserver::new());
  let results = BufferOutput::new();

  TractRunner::new(
    iter_input(input),
    serial(
      "sqrt-pipeline",
      func_tract("sqrt", 4, f64::sqrt),
      func_tract("round", 2, |x: f64| (x * 1000.0).round() / 1000.0),
    ),
    results.clone(),
  )
  .with_observer(observer.clone())
  .with_base_context(|_payload, seed| seed.with_tag("run.kind", "demo"))
  .run()
  .await?;

  let mut roots = results.take();
  roots.sort_by(|a, b| a.partial_cmp(b).expect("comparable"));
  println!("Pipeline completed.");
  println!("  Results: {roots:?}");
  println!("  Observability: {}", serde_json::to_string_pretty(&observer.summary())?);
  Ok(())
}
