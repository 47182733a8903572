//! Rendezvous mailbox: a send completes only once the actor takes the message.
//!
//! Each message travels with a one-shot acknowledgement that the receiver
//! fires when it pulls the message off the channel. Senders therefore wait
//! for a handoff rather than for buffer space, which gives natural
//! backpressure. Closing the receiver drops every message still in flight,
//! failing the waiting senders instead of leaving them hanging.

use tokio::sync::{mpsc, oneshot};

/// Mailbox send error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MailboxSendError {
	/// The receiver is closed or gone; the message was dropped.
	Closed,
}

struct Envelope<T> {
	msg: T,
	ack: oneshot::Sender<()>,
}

/// Multi-producer mailbox sender.
pub(crate) struct MailboxSender<T> {
	tx: mpsc::Sender<Envelope<T>>,
}

/// Sender that does not keep the mailbox open.
pub(crate) struct WeakMailboxSender<T> {
	tx: mpsc::WeakSender<Envelope<T>>,
}

/// Single-consumer mailbox receiver, owned by the actor processor.
pub(crate) struct MailboxReceiver<T> {
	rx: mpsc::Receiver<Envelope<T>>,
}

impl<T> Clone for MailboxSender<T> {
	fn clone(&self) -> Self {
		Self { tx: self.tx.clone() }
	}
}

impl<T> Clone for WeakMailboxSender<T> {
	fn clone(&self) -> Self {
		Self { tx: self.tx.clone() }
	}
}

/// Creates a rendezvous mailbox.
pub(crate) fn rendezvous<T>() -> (MailboxSender<T>, MailboxReceiver<T>) {
	// One slot holds the envelope being handed off; the ack makes the send
	// wait for the receiver regardless.
	let (tx, rx) = mpsc::channel(1);
	(MailboxSender { tx }, MailboxReceiver { rx })
}

impl<T> MailboxSender<T> {
	/// Hands `msg` to the receiver, waiting until it has been taken.
	pub async fn send(&self, msg: T) -> Result<(), MailboxSendError> {
		let (ack, acked) = oneshot::channel();
		self.tx.send(Envelope { msg, ack }).await.map_err(|_| MailboxSendError::Closed)?;
		acked.await.map_err(|_| MailboxSendError::Closed)
	}

	/// Returns `true` once the receiver is closed or dropped.
	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}

	/// Resolves when the receiver is closed or dropped.
	pub async fn closed(&self) {
		self.tx.closed().await;
	}

	pub fn downgrade(&self) -> WeakMailboxSender<T> {
		WeakMailboxSender { tx: self.tx.downgrade() }
	}
}

impl<T> WeakMailboxSender<T> {
	pub fn upgrade(&self) -> Option<MailboxSender<T>> {
		self.tx.upgrade().map(|tx| MailboxSender { tx })
	}
}

impl<T> MailboxReceiver<T> {
	/// Receives one message, acknowledging the handoff to its sender.
	///
	/// Returns `None` once every sender is gone and the channel is drained,
	/// or after [`MailboxReceiver::close`].
	pub async fn recv(&mut self) -> Option<T> {
		let envelope = self.rx.recv().await?;
		// A sender that gave up waiting still delivers; the ack just has no listener.
		let _ = envelope.ack.send(());
		Some(envelope.msg)
	}

	/// Refuses new sends and drops every message still waiting for handoff.
	pub fn close(&mut self) {
		self.rx.close();
		while let Ok(envelope) = self.rx.try_recv() {
			drop(envelope);
		}
	}
}
