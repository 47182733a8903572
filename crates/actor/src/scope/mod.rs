//! Structured spawn points for actors.
//!
//! A [`Scope`] owns the tasks of every actor spawned through it. Stopping the
//! scope cancels those actors and waits until each has run its teardown, so
//! no actor outlives the scope that spawned it.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::address::{Address, forward_staged};
use crate::behavior::Behavior;
use crate::error::{ActorError, ActorExit, ActorExitReason, join_error_panic_message};
use crate::mailbox;
use crate::processor::Processor;
use crate::signal::ActorEvent;
use crate::spec::ActorSpec;

/// Number of exit summaries a scope retains; older ones are discarded first.
pub const EXIT_HISTORY: usize = 1024;

/// What a scope does when one of its actors fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
	/// Siblings keep running; the failure is only recorded.
	#[default]
	Isolate,
	/// The first failure cancels every actor in the scope and closes it.
	StopAll,
}

struct ScopeInner {
	name: Arc<str>,
	policy: FailurePolicy,
	cancel: CancellationToken,
	tracker: TaskTracker,
	next_child: AtomicU64,
	closed: Mutex<bool>,
	exits: Mutex<VecDeque<ActorExit>>,
}

impl ScopeInner {
	fn closed(&self) -> MutexGuard<'_, bool> {
		self.closed.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn close(&self) {
		*self.closed() = true;
		self.tracker.close();
	}

	fn record(&self, exit: ActorExit) {
		let mut exits = self.exits.lock().unwrap_or_else(PoisonError::into_inner);
		if exits.len() == EXIT_HISTORY {
			exits.pop_front();
		}
		exits.push_back(exit);
	}

	fn child_failed(&self, exit: &ActorExit) {
		if self.policy == FailurePolicy::StopAll {
			tracing::warn!(scope = %self.name, actor = %exit.actor(), "actor failed, stopping scope");
			self.close();
			self.cancel.cancel();
		}
	}
}

impl Drop for ScopeInner {
	fn drop(&mut self) {
		if self.tracker.is_empty() {
			return;
		}
		// Nothing can be awaited here; cancelled actors keep running until their teardown is done.
		tracing::warn!(scope = %self.name, children = self.tracker.len(), "scope dropped without stop; detaching cancelled actors");
		self.cancel.cancel();
	}
}

/// Structured-concurrency boundary owning spawned actors.
///
/// Cloning yields another handle to the same scope.
#[derive(Clone)]
pub struct Scope {
	inner: Arc<ScopeInner>,
}

impl std::fmt::Debug for Scope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Scope")
			.field("name", &self.inner.name)
			.field("closed", &self.is_closed())
			.field("running", &self.running())
			.finish()
	}
}

impl Scope {
	/// Creates a root scope that isolates actor failures.
	pub fn new(name: impl Into<String>) -> Self {
		Self::with_policy(name, FailurePolicy::default())
	}

	/// Creates a root scope with an explicit failure policy.
	pub fn with_policy(name: impl Into<String>, policy: FailurePolicy) -> Self {
		Self::child_of(name, policy, CancellationToken::new())
	}

	pub(crate) fn child_of(name: impl Into<String>, policy: FailurePolicy, cancel: CancellationToken) -> Self {
		Self {
			inner: Arc::new(ScopeInner {
				name: Arc::from(name.into()),
				policy,
				cancel,
				tracker: TaskTracker::new(),
				next_child: AtomicU64::new(0),
				closed: Mutex::new(false),
				exits: Mutex::new(VecDeque::new()),
			}),
		}
	}

	/// Scope name.
	pub fn name(&self) -> &str {
		&self.inner.name
	}

	/// Returns `true` once the scope refuses new actors.
	pub fn is_closed(&self) -> bool {
		*self.inner.closed()
	}

	/// Number of actors that have not finished yet, teardown included.
	pub fn running(&self) -> usize {
		self.inner.tracker.len()
	}

	/// Spawns a named actor from a behavior factory.
	///
	/// # Errors
	///
	/// Returns [`ActorError::ScopeClosed`] if the scope is stopping.
	pub fn spawn<T, F>(&self, name: impl Into<String>, factory: F) -> Result<Address<T>, ActorError>
	where
		T: Send + 'static,
		F: Fn() -> Behavior<T> + Send + Sync + 'static,
	{
		self.spawn_spec(ActorSpec::new(factory).name(name))
	}

	/// Spawns an actor from a full spec.
	///
	/// Returns as soon as the mailbox exists; the actor enters its behavior
	/// on its own task.
	///
	/// # Errors
	///
	/// Returns [`ActorError::ScopeClosed`] if the scope is stopping.
	///
	/// # Panics
	///
	/// Panics when called outside a tokio runtime.
	pub fn spawn_spec<T>(&self, spec: ActorSpec<T>) -> Result<Address<T>, ActorError>
	where
		T: Send + 'static,
	{
		// Held until the task is tracked so `stop` cannot close the tracker in between.
		let closed = self.inner.closed();
		if *closed {
			return Err(ActorError::ScopeClosed {
				scope: self.inner.name.to_string(),
			});
		}

		let id = self.inner.next_child.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
		let name: Arc<str> = match spec.name {
			Some(name) => Arc::from(name),
			None => Arc::from(format!("{}/{id}", self.inner.name)),
		};

		let (tx, rx) = mailbox::rendezvous();
		let (staged_tx, staged_rx) = mpsc::unbounded_channel();
		let (events, _) = broadcast::channel(spec.event_buffer);
		let address = Address::new(Arc::clone(&name), tx.clone(), staged_tx, events.clone());
		let processor = Processor::new(
			Arc::clone(&name),
			spec.factory,
			spec.max_restarts,
			rx,
			events.clone(),
			self.inner.cancel.child_token(),
			address.downgrade(),
		);

		let task_name = Arc::clone(&name);
		let actor = tokio::spawn(async move {
			let done = CancellationToken::new();
			let forwarder = forward_staged(Arc::clone(&task_name), staged_rx, tx, done.clone());
			let run = async {
				let reason = processor.run().await;
				done.cancel();
				reason
			};
			let (reason, ()) = tokio::join!(run, forwarder);
			reason
		});

		// The tracked watcher outlives the actor task, so `stop` waits for panicked actors too.
		let scope = Arc::downgrade(&self.inner);
		let watched = Arc::clone(&name);
		self.inner.tracker.spawn(async move {
			let reason = match actor.await {
				Ok(reason) => reason,
				Err(err) if err.is_panic() => ActorExitReason::Panicked(join_error_panic_message(err)),
				Err(err) => ActorExitReason::JoinFailed(err.to_string()),
			};
			let exit = ActorExit::new(&*watched, &reason);
			let _ = events.send(ActorEvent::Stopped(exit.clone()));
			report_exit(&scope, exit);
		});
		drop(closed);

		tracing::debug!(scope = %self.inner.name, actor = %name, running = self.inner.tracker.len(), "scope.spawn");
		Ok(address)
	}

	/// Cancels every actor and waits until all of them finished their teardown.
	///
	/// Idempotent and cancel-safe: every caller, concurrent or later, returns
	/// only once the last child is done, even if another caller gave up waiting.
	pub async fn stop(&self) {
		self.inner.cancel.cancel();
		self.finish().await;
	}

	/// Closes the scope and waits for every actor to terminate on its own.
	///
	/// Actors end when they stop, fail, or their addresses are all dropped;
	/// call [`Scope::stop`] to cancel them instead.
	pub async fn join(&self) {
		self.finish().await;
	}

	async fn finish(&self) {
		self.inner.close();
		tracing::debug!(scope = %self.inner.name, running = self.inner.tracker.len(), "scope.join");
		self.inner.tracker.wait().await;
		tracing::debug!(scope = %self.inner.name, "scope.joined");
	}

	/// Exit summaries of terminated actors, oldest first.
	///
	/// Only the most recent [`EXIT_HISTORY`] exits are kept.
	pub fn exits(&self) -> Vec<ActorExit> {
		self.inner.exits.lock().unwrap_or_else(PoisonError::into_inner).iter().cloned().collect()
	}

	/// Exit summaries of failed actors among [`Scope::exits`].
	pub fn failures(&self) -> Vec<ActorExit> {
		self.exits().into_iter().filter(ActorExit::is_failure).collect()
	}
}

fn report_exit(scope: &Weak<ScopeInner>, exit: ActorExit) {
	if exit.is_failure() {
		tracing::error!(actor = %exit.actor(), kind = ?exit.kind(), error = exit.message().unwrap_or_default(), "actor terminated");
	} else {
		tracing::debug!(actor = %exit.actor(), kind = ?exit.kind(), "actor terminated");
	}
	let Some(scope) = scope.upgrade() else {
		return;
	};
	if exit.is_failure() {
		scope.child_failed(&exit);
	}
	scope.record(exit);
}

/// Runs `body` inside a fresh scope and stops the scope before returning.
///
/// Every actor spawned in `body` has finished its teardown once this resolves.
pub async fn open<F, Fut, R>(name: impl Into<String>, body: F) -> R
where
	F: FnOnce(Scope) -> Fut,
	Fut: Future<Output = R>,
{
	let scope = Scope::new(name);
	let output = body(scope.clone()).await;
	scope.stop().await;
	output
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests;
