//! Serial composition: two tracts chained through an internal link.

use std::sync::Arc;

use async_trait::async_trait;

use crate::channel::Channel;
use crate::error::InitError;
use crate::input::InputRef;
use crate::observe;
use crate::output::{OutputLink, OutputRef};
use crate::request::RequestWrapper;
use crate::tract::{Starter, Tract, Waiter};

/// Two tracts run as one: `head` feeds `tail` through an internal
/// channel. The tail starts first so the consumer side is ready before
/// the head emits; waiting awaits the head (which closes the link when
/// its input drains) and then the tail.
pub struct SerialGroupTract<I, M, O> {
  name: String,
  head: Box<dyn Tract<I, M>>,
  tail: Box<dyn Tract<M, O>>,
}

impl<I, M, O> SerialGroupTract<I, M, O>
where
  I: Send + 'static,
  M: Send + 'static,
  O: Send + 'static,
{
  pub fn new(
    name: impl Into<String>,
    head: impl Tract<I, M> + 'static,
    tail: impl Tract<M, O> + 'static,
  ) -> Self {
    Self::from_boxed(name.into(), Box::new(head), Box::new(tail))
  }

  fn from_boxed(name: String, head: Box<dyn Tract<I, M>>, tail: Box<dyn Tract<M, O>>) -> Self {
    Self { name, head, tail }
  }
}

#[async_trait]
impl<I, M, O> Tract<I, O> for SerialGroupTract<I, M, O>
where
  I: Send + 'static,
  M: Send + 'static,
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
    let link: Arc<Channel<RequestWrapper<M>>> = Arc::new(Channel::default());

    let head_starter = self
      .head
      .init(input, OutputLink::owned(link.clone() as OutputRef<RequestWrapper<M>>))
      .await
      .map_err(|source| InitError::Head {
        name: self.head.name().to_string(),
        source: Box::new(source),
      })?;
    let tail_starter =
      self.tail.init(link, output).await.map_err(|source| InitError::Tail {
        name: self.tail.name().to_string(),
        source: Box::new(source),
      })?;

    Ok(Starter::new(move || {
      let tail_waiter = tail_starter.start();
      let head_waiter = head_starter.start();
      Waiter::new(async move {
        head_waiter.wait().await;
        tail_waiter.wait().await;
      })
    }))
  }
}

/// Builder for chaining a head tract into a serial group.
///
/// `Linker::named("stage", head).link(tail)` reads better than nesting
/// [`SerialGroupTract::new`] calls when assembling longer chains.
pub struct Linker<I, M> {
  name: String,
  head: Box<dyn Tract<I, M>>,
}

impl<I, M> Linker<I, M>
where
  I: Send + 'static,
  M: Send + 'static,
{
  /// An unnamed link: the resulting serial group emits no spans or
  /// metrics of its own.
  pub fn new(head: impl Tract<I, M> + 'static) -> Self {
    Self { name: String::new(), head: Box::new(head) }
  }

  pub fn named(name: impl Into<String>, head: impl Tract<I, M> + 'static) -> Self {
    Self { name: name.into(), head: Box::new(head) }
  }

  pub fn link<O>(self, tail: impl Tract<M, O> + 'static) -> SerialGroupTract<I, M, O>
  where
    O: Send + 'static,
  {
    SerialGroupTract::from_boxed(self.name, self.head, Box::new(tail))
  }
}
