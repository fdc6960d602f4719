//! Parallel composition: sibling tracts sharing one input and one output.

use async_trait::async_trait;

use crate::error::InitError;
use crate::input::InputRef;
use crate::observe;
use crate::output::{Output, OutputLink};
use crate::request::RequestWrapper;
use crate::tract::{Starter, Tract, Waiter};

/// Fans a shared input across sibling tracts. Each request is taken by
/// exactly one sibling; all siblings put to the same output through
/// non-closing views, and the group closes the real output once after
/// every sibling finishes.
pub struct ParallelGroupTract<I, O> {
  name: String,
  tracts: Vec<Box<dyn Tract<I, O>>>,
}

impl<I, O> ParallelGroupTract<I, O>
where
  I: Send + 'static,
  O: Send + 'static,
{
  pub fn new(name: impl Into<String>, tracts: Vec<Box<dyn Tract<I, O>>>) -> Self {
    Self { name: name.into(), tracts }
  }
}

#[async_trait]
impl<I, O> Tract<I, O> for ParallelGroupTract<I, O>
where
  I: Send + 'static,
  O: Send + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn init(
    &self,
    input: InputRef<RequestWrapper<I>>,
    output: OutputLink<RequestWrapper<O>>,
  ) -> Result<Starter, InitError> {
    let (input, output) = observe::group_links(&self.name, input, output);

    let mut starters = Vec::with_capacity(self.tracts.len());
    for (index, tract) in self.tracts.iter().enumerate() {
      let starter =
        tract.init(input.clone(), output.shared()).await.map_err(|source| InitError::Branch {
          index,
          name: tract.name().to_string(),
          source: Box::new(source),
        })?;
      starters.push(starter);
    }

    Ok(Starter::new(move || {
      let waiters: Vec<Waiter> = starters.into_iter().map(Starter::start).collect();
      Waiter::new(async move {
        for waiter in waiters {
          waiter.wait().await;
        }
        output.close();
      })
    }))
  }
}
