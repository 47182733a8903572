use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use super::{Behavior, BehaviorSetup};
use crate::context::ActorContext;
use crate::signal::ExitReason;

type TeardownFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Teardown = Box<dyn FnOnce(ExitReason) -> TeardownFuture + Send>;

/// Output of a setup initializer: the handling behavior and its teardown.
pub struct Scoped<T> {
	behavior: Behavior<T>,
	teardown: Option<Teardown>,
}

impl<T> Scoped<T> {
	/// Yields `behavior` with no teardown.
	pub fn new(behavior: Behavior<T>) -> Self {
		Self { behavior, teardown: None }
	}

	/// Registers the continuation that releases what the initializer acquired.
	///
	/// It runs exactly once when the incarnation ends, whatever the reason.
	#[must_use]
	pub fn on_exit<F, Fut>(mut self, teardown: F) -> Self
	where
		F: FnOnce(ExitReason) -> Fut + Send + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		self.teardown = Some(Box::new(move |reason| Box::pin(teardown(reason))));
		self
	}
}

impl<T> From<Behavior<T>> for Scoped<T> {
	fn from(behavior: Behavior<T>) -> Self {
		Self::new(behavior)
	}
}

/// Closure-backed `Setup` behavior.
pub(super) struct FnSetup<F> {
	initializer: Option<F>,
	teardown: Option<Teardown>,
}

impl<F> FnSetup<F> {
	pub(super) fn new(initializer: F) -> Self {
		Self {
			initializer: Some(initializer),
			teardown: None,
		}
	}
}

#[async_trait]
impl<T, F, Fut> BehaviorSetup<T> for FnSetup<F>
where
	T: Send + 'static,
	F: FnOnce(ActorContext<T>) -> Fut + Send + 'static,
	Fut: Future<Output = anyhow::Result<Scoped<T>>> + Send + 'static,
{
	async fn enter(&mut self, ctx: ActorContext<T>) -> anyhow::Result<Behavior<T>> {
		let Some(initializer) = self.initializer.take() else {
			anyhow::bail!("setup behavior entered twice; spawn a factory so each incarnation builds a fresh one");
		};
		let scoped = initializer(ctx).await?;
		self.teardown = scoped.teardown;
		Ok(scoped.behavior)
	}

	async fn exit(&mut self, reason: ExitReason) {
		if let Some(teardown) = self.teardown.take() {
			teardown(reason).await;
		}
	}
}
