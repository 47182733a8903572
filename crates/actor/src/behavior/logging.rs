use std::fmt::Debug;

use async_trait::async_trait;

use super::BehaviorHandler;
use crate::signal::DispatchResult;

/// Handler decorator logging every message around the wrapped dispatch.
pub(super) struct LoggingHandler<T> {
	inner: Box<dyn BehaviorHandler<T>>,
}

impl<T> LoggingHandler<T> {
	pub(super) fn new(inner: Box<dyn BehaviorHandler<T>>) -> Self {
		Self { inner }
	}
}

#[async_trait]
impl<T> BehaviorHandler<T> for LoggingHandler<T>
where
	T: Debug + Send + 'static,
{
	async fn handle(&mut self, msg: T) -> anyhow::Result<DispatchResult<T>> {
		let label = format!("{msg:?}");
		tracing::debug!(msg = %label, "actor.handle.start");
		let result = self.inner.handle(msg).await;
		match &result {
			Ok(outcome) => tracing::debug!(msg = %label, outcome = ?outcome, "actor.handle.end"),
			Err(err) => tracing::debug!(msg = %label, error = %err, "actor.handle.failed"),
		}
		result
	}
}
