//! Fan-out composition: a head tract whose every output request is
//! cloned to each of K tail tracts.

use std::sync::Arc;

use async_trait::async_trait;

use crate::channel::Channel;
use crate::error::InitError;
use crate::input::InputRef;
use crate::observe;
use crate::output::{MultiOutput, Output, OutputLink};
use crate::request::RequestWrapper;
use crate::tract::{Starter, Tract, Waiter};

/// Head tract `I → M` feeding K tails `M → O`; every request the head
/// produces reaches every tail as an independent clone, with span-end
/// accounting shared so each span open at the fork ends exactly once.
/// Tails start before the head; the waiter awaits the head, then the
/// tails, then closes the shared output once.
pub struct FanOutGroupTract<I, M, O> {
  name: String,
  head: Box<dyn Tract<I, M>>,
  tails: Vec<Box<dyn Tract<M, O>>>,
}

impl<I, M, O> FanOutGroupTract<I, M, O>
where
  I: Send + 'static,
  M: Clone + Send + 'static,
  O: Send + 'static,
{
  pub fn new(
    name: impl Into<String>,
    head: impl Tract<I, M> + 'static,
    tails: Vec<Box<dyn Tract<M, O>>>,
  ) -> Self {
    Self { name: name.into(), head: Box::new(head), tails }
  }
}

#[async_trait]
impl<I, M, O> Tract<I, O> for FanOutGroupTract<I, M, O>
where
  I: Send + 'static,
  M: Clone + Send + 'static,
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

    let links: Vec<Arc<Channel<RequestWrapper<M>>>> =
      (0..self.tails.len()).map(|_| Arc::new(Channel::default())).collect();
    let multi = MultiOutput::new(links.iter().map(|link| OutputLink::owned(link.clone())).collect());

    let head_starter = self
      .head
      .init(input, OutputLink::owned(Arc::new(multi)))
      .await
      .map_err(|source| InitError::Head {
        name: self.head.name().to_string(),
        source: Box::new(source),
      })?;

    let mut tail_starters = Vec::with_capacity(self.tails.len());
    for (index, (tract, link)) in self.tails.iter().zip(links).enumerate() {
      let starter =
        tract.init(link, output.shared()).await.map_err(|source| InitError::FanOutTail {
          index,
          name: tract.name().to_string(),
          source: Box::new(source),
        })?;
      tail_starters.push(starter);
    }

    Ok(Starter::new(move || {
      let tail_waiters: Vec<Waiter> = tail_starters.into_iter().map(Starter::start).collect();
      let head_waiter = head_starter.start();
      Waiter::new(async move {
        head_waiter.wait().await;
        for waiter in tail_waiters {
          waiter.wait().await;
        }
        output.close();
      })
    }))
  }
}
