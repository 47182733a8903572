use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::BehaviorHandler;
use crate::error::ActorError;
use crate::signal::DispatchResult;

type CheckFn<T> = dyn Fn(&T) -> bool + Send + Sync;

/// Optional runtime assertion on incoming messages.
///
/// Static typing already pins an address to one message type; this is an
/// escape hatch for dynamically typed mailboxes such as `Box<dyn Any + Send>`.
pub struct TypeCheck<T> {
	expected: &'static str,
	check: Arc<CheckFn<T>>,
}

impl<T> Clone for TypeCheck<T> {
	fn clone(&self) -> Self {
		Self {
			expected: self.expected,
			check: Arc::clone(&self.check),
		}
	}
}

impl<T> TypeCheck<T> {
	/// Creates a check from a description of the accepted type and a predicate.
	pub fn new(expected: &'static str, check: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
		Self {
			expected,
			check: Arc::new(check),
		}
	}

	/// Description of the accepted message type.
	pub fn expected(&self) -> &'static str {
		self.expected
	}

	pub(crate) fn verify(&self, msg: &T) -> Result<(), ActorError> {
		if (self.check)(msg) {
			Ok(())
		} else {
			Err(ActorError::TypeMismatch { expected: self.expected })
		}
	}
}

impl TypeCheck<Box<dyn Any + Send>> {
	/// Accepts boxed messages whose concrete type is `U`.
	pub fn is<U: Any>() -> Self {
		Self::new(std::any::type_name::<U>(), |msg: &Box<dyn Any + Send>| (**msg).is::<U>())
	}
}

/// Closure-backed `Receive` handler.
pub(super) struct FnHandler<T, F> {
	handler: F,
	check: Option<TypeCheck<T>>,
}

impl<T, F> FnHandler<T, F> {
	pub(super) fn new(handler: F, check: Option<TypeCheck<T>>) -> Self {
		Self { handler, check }
	}
}

#[async_trait]
impl<T, F, Fut> BehaviorHandler<T> for FnHandler<T, F>
where
	T: Send + 'static,
	F: FnMut(T) -> Fut + Send + 'static,
	Fut: Future<Output = anyhow::Result<DispatchResult<T>>> + Send + 'static,
{
	async fn handle(&mut self, msg: T) -> anyhow::Result<DispatchResult<T>> {
		if let Some(check) = &self.check {
			check.verify(&msg)?;
		}
		(self.handler)(msg).await
	}
}
