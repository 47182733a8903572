use std::future::Future;

use async_trait::async_trait;

use super::{Behavior, BehaviorHandler};
use crate::signal::DispatchResult;

/// Supervisor decision for one handler error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperviseStrategy {
	/// Tear down and re-run the actor's behavior factory.
	Restart,
	/// Terminate the actor gracefully.
	Stop,
	/// Drop the failed message and keep the current handler.
	Ignore,
}

impl<T> From<SuperviseStrategy> for DispatchResult<T> {
	fn from(strategy: SuperviseStrategy) -> Self {
		match strategy {
			SuperviseStrategy::Restart => Self::Restart,
			SuperviseStrategy::Stop => Self::Stop,
			SuperviseStrategy::Ignore => Self::Same,
		}
	}
}

/// Handler decorator converting errors into signals through a strategy.
pub(super) struct SupervisedHandler<T, S> {
	strategy: S,
	inner: Box<dyn BehaviorHandler<T>>,
}

impl<T, S> SupervisedHandler<T, S> {
	pub(super) fn new(strategy: S, inner: Box<dyn BehaviorHandler<T>>) -> Self {
		Self { strategy, inner }
	}
}

#[async_trait]
impl<T, S, Fut> BehaviorHandler<T> for SupervisedHandler<T, S>
where
	T: Send + 'static,
	S: Fn(anyhow::Error) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = anyhow::Result<SuperviseStrategy>> + Send + 'static,
{
	async fn handle(&mut self, msg: T) -> anyhow::Result<DispatchResult<T>> {
		match self.inner.handle(msg).await {
			// Adopt replacement handlers so supervision outlives behavior changes.
			Ok(DispatchResult::Become(Behavior::Receive(next))) => {
				self.inner = next;
				Ok(DispatchResult::Same)
			}
			Ok(result) => Ok(result),
			Err(err) => {
				tracing::debug!(error = %err, "actor.supervise.intercept");
				let decision = (self.strategy)(err).await?;
				tracing::debug!(decision = ?decision, "actor.supervise.decision");
				Ok(decision.into())
			}
		}
	}
}
