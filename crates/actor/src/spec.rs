use std::sync::Arc;

use crate::behavior::Behavior;

pub(crate) type BehaviorFactory<T> = dyn Fn() -> Behavior<T> + Send + Sync;

/// Default lifecycle event broadcast capacity.
const DEFAULT_EVENT_BUFFER: usize = 64;

/// Builder spec for one actor.
pub struct ActorSpec<T> {
	pub(crate) name: Option<String>,
	pub(crate) event_buffer: usize,
	pub(crate) max_restarts: Option<usize>,
	pub(crate) factory: Arc<BehaviorFactory<T>>,
}

impl<T> ActorSpec<T>
where
	T: Send + 'static,
{
	/// Creates a spec from a behavior factory.
	///
	/// The factory runs once at spawn and again on every restart, so each
	/// incarnation starts from a fresh behavior.
	pub fn new(factory: impl Fn() -> Behavior<T> + Send + Sync + 'static) -> Self {
		Self {
			name: None,
			event_buffer: DEFAULT_EVENT_BUFFER,
			max_restarts: None,
			factory: Arc::new(factory),
		}
	}

	/// Sets the actor name. Unnamed actors are numbered within their scope.
	#[must_use]
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the lifecycle event broadcast capacity.
	///
	/// # Panics
	///
	/// Panics if `size` is zero.
	#[must_use]
	pub fn event_buffer(mut self, size: usize) -> Self {
		assert!(size > 0, "event buffer size must be > 0");
		self.event_buffer = size;
		self
	}

	/// Caps the number of restarts; a restart past the cap fails the actor.
	#[must_use]
	pub fn max_restarts(mut self, max: usize) -> Self {
		self.max_restarts = Some(max);
		self
	}
}
