//! Typed send handles for actors.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::ActorError;
use crate::mailbox::{MailboxSender, WeakMailboxSender};
use crate::signal::ActorEvent;

/// Receiver of one actor's lifecycle events.
pub type ActorEventReceiver = broadcast::Receiver<ActorEvent>;

/// Typed handle used to send messages to one actor.
///
/// Addresses are cheap to clone. The actor's lifetime is independent of its
/// addresses, except that an actor whose addresses are all dropped drains its
/// mailbox and terminates.
pub struct Address<T> {
	name: Arc<str>,
	tx: MailboxSender<T>,
	staged: mpsc::UnboundedSender<T>,
	events: broadcast::Sender<ActorEvent>,
}

/// Address that does not keep the actor's mailbox open.
pub struct WeakAddress<T> {
	name: Arc<str>,
	tx: WeakMailboxSender<T>,
	staged: mpsc::WeakUnboundedSender<T>,
	events: broadcast::Sender<ActorEvent>,
}

impl<T> Clone for Address<T> {
	fn clone(&self) -> Self {
		Self {
			name: Arc::clone(&self.name),
			tx: self.tx.clone(),
			staged: self.staged.clone(),
			events: self.events.clone(),
		}
	}
}

impl<T> Clone for WeakAddress<T> {
	fn clone(&self) -> Self {
		Self {
			name: Arc::clone(&self.name),
			tx: self.tx.clone(),
			staged: self.staged.clone(),
			events: self.events.clone(),
		}
	}
}

impl<T> std::fmt::Debug for Address<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Address").field("name", &self.name).field("closed", &self.is_closed()).finish()
	}
}

impl<T> Address<T> {
	pub(crate) fn new(name: Arc<str>, tx: MailboxSender<T>, staged: mpsc::UnboundedSender<T>, events: broadcast::Sender<ActorEvent>) -> Self {
		Self { name, tx, staged, events }
	}

	/// Actor name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns `true` once the actor no longer accepts messages.
	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}

	/// Resolves once the actor no longer accepts messages.
	pub async fn closed(&self) {
		self.tx.closed().await;
	}

	/// Subscribes to this actor's lifecycle events.
	pub fn subscribe(&self) -> ActorEventReceiver {
		self.events.subscribe()
	}

	/// Creates a weak address to the same actor.
	pub fn downgrade(&self) -> WeakAddress<T> {
		WeakAddress {
			name: Arc::clone(&self.name),
			tx: self.tx.downgrade(),
			staged: self.staged.downgrade(),
			events: self.events.clone(),
		}
	}
}

impl<T> Address<T>
where
	T: Send + 'static,
{
	/// Sends one message, waiting until the actor takes it.
	///
	/// # Errors
	///
	/// Returns [`ActorError::MailboxClosed`] if the actor has terminated or
	/// terminates before taking the message.
	pub async fn send(&self, msg: T) -> Result<(), ActorError> {
		self.tx.send(msg).await.map_err(|_| {
			tracing::debug!(actor = %self.name, "actor.send.closed");
			ActorError::MailboxClosed { actor: self.name.to_string() }
		})
	}

	/// Queues one message without waiting.
	///
	/// Queued messages reach the actor in the order they were queued. If the
	/// actor has terminated the message is dropped with a warning.
	pub fn send_nowait(&self, msg: T) {
		if self.tx.is_closed() || self.staged.send(msg).is_err() {
			tracing::warn!(actor = %self.name, "could not send message, actor already terminated");
		}
	}
}

impl<T> WeakAddress<T> {
	/// Actor name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns a strong address while any other strong address is alive.
	pub fn upgrade(&self) -> Option<Address<T>> {
		let tx = self.tx.upgrade()?;
		let staged = self.staged.upgrade()?;
		Some(Address::new(Arc::clone(&self.name), tx, staged, self.events.clone()))
	}
}

/// Drains `send_nowait` messages into the mailbox in queue order.
///
/// Runs inside the actor's task until every address is gone, the mailbox
/// closes, or `done` fires when the processor terminates.
pub(crate) async fn forward_staged<T>(name: Arc<str>, mut staged: mpsc::UnboundedReceiver<T>, tx: MailboxSender<T>, done: CancellationToken)
where
	T: Send + 'static,
{
	loop {
		let msg = tokio::select! {
			biased;
			_ = done.cancelled() => break,
			msg = staged.recv() => {
				let Some(msg) = msg else {
					break;
				};
				msg
			}
		};
		let delivered = tokio::select! {
			biased;
			_ = done.cancelled() => false,
			result = tx.send(msg) => result.is_ok(),
		};
		if !delivered {
			tracing::warn!(actor = %name, "could not send message, actor already terminated");
			break;
		}
	}

	staged.close();
	let mut dropped = 0usize;
	while staged.try_recv().is_ok() {
		dropped = dropped.wrapping_add(1);
	}
	if dropped > 0 {
		tracing::warn!(actor = %name, dropped, "dropping queued messages, actor already terminated");
	}
	tracing::trace!(actor = %name, "actor.forwarder.exit");
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
	use std::rc::Rc;

	use super::*;
	use crate::mailbox;

	fn detached<T>(name: &str) -> (Address<T>, mailbox::MailboxReceiver<T>) {
		let (tx, rx) = mailbox::rendezvous();
		let (staged, _staged_rx) = mpsc::unbounded_channel();
		let (events, _) = broadcast::channel(4);
		(Address::new(Arc::from(name), tx, staged, events), rx)
	}

	#[test]
	fn debug_and_state_do_not_require_send_messages() {
		// `Rc` is not `Send`; inspecting the address must still work.
		let (addr, mut rx) = detached::<Rc<u8>>("local");
		assert_eq!(format!("{addr:?}"), r#"Address { name: "local", closed: false }"#);

		rx.close();
		assert!(addr.is_closed());
		assert_eq!(addr.downgrade().name(), "local");
		assert_eq!(format!("{addr:?}"), r#"Address { name: "local", closed: true }"#);
	}

	#[tokio::test]
	async fn weak_address_upgrades_only_while_strong_ones_live() {
		let (addr, _rx) = detached::<u8>("weak");
		let weak = addr.downgrade();
		assert!(weak.upgrade().is_some());
		drop(addr);
		assert!(weak.upgrade().is_none());
	}
}
