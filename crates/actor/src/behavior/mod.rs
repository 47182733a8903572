//! Behavior abstraction: how an actor reacts to its next message.
//!
//! A [`Behavior`] is either a message handler ([`BehaviorHandler`]) or a
//! scoped initializer ([`BehaviorSetup`]) that acquires resources, yields the
//! behavior used for message handling and releases the resources when the
//! actor's incarnation ends. [`Behaviors`] builds both from closures and
//! decorates handlers with supervision or logging.

use std::fmt::Debug;
use std::future::Future;

use async_trait::async_trait;

use crate::context::ActorContext;
use crate::error::ActorError;
use crate::signal::{DispatchResult, ExitReason};

mod logging;
mod receive;
mod setup;
mod supervise;

pub use receive::TypeCheck;
pub use setup::Scoped;
pub use supervise::SuperviseStrategy;

use logging::LoggingHandler;
use receive::FnHandler;
use setup::FnSetup;
use supervise::SupervisedHandler;

/// Message handling step of a `Receive` behavior.
#[async_trait]
pub trait BehaviorHandler<T>: Send + 'static {
	/// Handles one message and decides what happens next.
	async fn handle(&mut self, msg: T) -> anyhow::Result<DispatchResult<T>>;
}

/// Acquire/release contract of a `Setup` behavior.
///
/// The processor calls [`enter`](BehaviorSetup::enter) once per incarnation
/// and [`exit`](BehaviorSetup::exit) exactly once after a successful enter,
/// on every exit path including cancellation.
#[async_trait]
pub trait BehaviorSetup<T>: Send + 'static {
	/// Acquires resources and yields the behavior that handles messages.
	async fn enter(&mut self, ctx: ActorContext<T>) -> anyhow::Result<Behavior<T>>;

	/// Releases whatever [`enter`](BehaviorSetup::enter) acquired.
	async fn exit(&mut self, reason: ExitReason);
}

/// Description of how an actor reacts to messages.
pub enum Behavior<T> {
	/// Handles messages directly.
	Receive(Box<dyn BehaviorHandler<T>>),
	/// Initializes a scope that yields the handling behavior.
	Setup(Box<dyn BehaviorSetup<T>>),
}

impl<T> Behavior<T>
where
	T: Send + 'static,
{
	/// Wraps a handler implementation.
	pub fn from_handler(handler: impl BehaviorHandler<T>) -> Self {
		Self::Receive(Box::new(handler))
	}

	/// Wraps a setup implementation.
	pub fn from_setup(setup: impl BehaviorSetup<T>) -> Self {
		Self::Setup(Box::new(setup))
	}

	/// Returns `true` for `Receive`-class behaviors.
	pub fn is_receive(&self) -> bool {
		matches!(self, Self::Receive(_))
	}

	fn into_handler(self, combinator: &str) -> Result<Box<dyn BehaviorHandler<T>>, ActorError> {
		match self {
			Self::Receive(handler) => Ok(handler),
			Self::Setup(_) => Err(ActorError::Precondition(format!("{combinator} requires a receive behavior, got a setup behavior"))),
		}
	}
}

impl<T> Debug for Behavior<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Receive(_) => f.write_str("Behavior::Receive"),
			Self::Setup(_) => f.write_str("Behavior::Setup"),
		}
	}
}

/// Behavior constructors and decorators.
pub struct Behaviors;

impl Behaviors {
	/// Builds a `Receive` behavior from an async handler closure.
	pub fn receive<T, F, Fut>(handler: F) -> Behavior<T>
	where
		T: Send + 'static,
		F: FnMut(T) -> Fut + Send + 'static,
		Fut: Future<Output = anyhow::Result<DispatchResult<T>>> + Send + 'static,
	{
		Behavior::from_handler(FnHandler::new(handler, None))
	}

	/// Builds a `Receive` behavior that asserts `check` on every message.
	///
	/// Messages failing the check never reach `handler`; the dispatch fails
	/// with [`ActorError::TypeMismatch`].
	pub fn receive_checked<T, F, Fut>(handler: F, check: TypeCheck<T>) -> Behavior<T>
	where
		T: Send + 'static,
		F: FnMut(T) -> Fut + Send + 'static,
		Fut: Future<Output = anyhow::Result<DispatchResult<T>>> + Send + 'static,
	{
		Behavior::from_handler(FnHandler::new(handler, Some(check)))
	}

	/// Builds a `Setup` behavior from an async initializer.
	///
	/// The initializer runs once per incarnation and returns the handling
	/// behavior plus an optional teardown continuation, see [`Scoped`].
	pub fn setup<T, F, Fut>(initializer: F) -> Behavior<T>
	where
		T: Send + 'static,
		F: FnOnce(ActorContext<T>) -> Fut + Send + 'static,
		Fut: Future<Output = anyhow::Result<Scoped<T>>> + Send + 'static,
	{
		Behavior::from_setup(FnSetup::new(initializer))
	}

	/// Wraps a `Receive` behavior with a fault-handling strategy.
	///
	/// Errors raised by the wrapped handler are passed to `strategy`, whose
	/// answer becomes the dispatch result. Errors raised by `strategy` itself
	/// propagate unsupervised.
	///
	/// # Errors
	///
	/// Returns [`ActorError::Precondition`] if `behavior` is a setup behavior.
	pub fn supervise<T, S, Fut>(strategy: S, behavior: Behavior<T>) -> Result<Behavior<T>, ActorError>
	where
		T: Send + 'static,
		S: Fn(anyhow::Error) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<SuperviseStrategy>> + Send + 'static,
	{
		let inner = behavior.into_handler("supervise")?;
		Ok(Behavior::from_handler(SupervisedHandler::new(strategy, inner)))
	}

	/// Wraps a `Receive` behavior so every message is logged before and after handling.
	///
	/// # Errors
	///
	/// Returns [`ActorError::Precondition`] if `behavior` is a setup behavior.
	pub fn logged<T>(behavior: Behavior<T>) -> Result<Behavior<T>, ActorError>
	where
		T: Debug + Send + 'static,
	{
		let inner = behavior.into_handler("logged")?;
		Ok(Behavior::from_handler(LoggingHandler::new(inner)))
	}
}
