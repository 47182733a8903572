use std::sync::{Arc, Mutex, PoisonError};

use crate::address::{Address, WeakAddress};
use crate::scope::{FailurePolicy, Scope};
use crate::token::GenerationToken;

/// Execution context handed to setup initializers.
///
/// One context exists per incarnation; restarting the actor builds a new one
/// with the next generation.
pub struct ActorContext<T> {
	name: Arc<str>,
	token: GenerationToken,
	myself: WeakAddress<T>,
	scopes: Arc<Mutex<Vec<Scope>>>,
}

impl<T> Clone for ActorContext<T> {
	fn clone(&self) -> Self {
		Self {
			name: Arc::clone(&self.name),
			token: self.token.clone(),
			myself: self.myself.clone(),
			scopes: Arc::clone(&self.scopes),
		}
	}
}

impl<T> ActorContext<T>
where
	T: Send + 'static,
{
	pub(crate) fn new(name: Arc<str>, token: GenerationToken, myself: WeakAddress<T>) -> Self {
		Self {
			name,
			token,
			myself,
			scopes: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// Actor name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Incarnation counter, starting at 1 and bumped on every restart.
	pub fn generation(&self) -> u64 {
		self.token.generation()
	}

	/// Returns whether the owning scope has cancelled this actor.
	pub fn is_cancelled(&self) -> bool {
		self.token.is_cancelled()
	}

	/// Resolves once the owning scope cancels this actor.
	pub async fn cancelled(&self) {
		self.token.cancelled().await;
	}

	/// Returns an address to this actor while it still accepts messages.
	///
	/// Holding the returned address keeps the mailbox open; keep
	/// [`ActorContext::myself_weak`] instead when the actor should still stop
	/// once its other addresses are dropped.
	pub fn myself(&self) -> Option<Address<T>> {
		self.myself.upgrade()
	}

	/// Weak address to this actor.
	pub fn myself_weak(&self) -> WeakAddress<T> {
		self.myself.clone()
	}

	/// Opens a scope whose actors are children of this incarnation.
	///
	/// The scope is cancelled with this actor and joined after the setup
	/// teardowns of the incarnation have run.
	pub fn child_scope(&self, name: &str) -> Scope {
		let scope = Scope::child_of(format!("{}/{name}", self.name), FailurePolicy::default(), self.token.child());
		self.scopes.lock().unwrap_or_else(PoisonError::into_inner).push(scope.clone());
		scope
	}

	pub(crate) fn take_child_scopes(&self) -> Vec<Scope> {
		std::mem::take(&mut *self.scopes.lock().unwrap_or_else(PoisonError::into_inner))
	}
}
