//! Dispatch outcomes and lifecycle notifications.

use crate::behavior::Behavior;
use crate::error::ActorExit;

/// Non-replacement outcome of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
	/// Keep the current handler for the next message.
	Same,
	/// Terminate the actor gracefully.
	Stop,
	/// Tear down and re-run the actor's behavior factory.
	Restart,
	/// The message was not handled; the handler stays current.
	Ignored,
}

/// Result of handing one message to a handler.
///
/// Every dispatch produces exactly one of these; the processor matches on it
/// to decide its next state.
pub enum DispatchResult<T> {
	Same,
	Stop,
	Restart,
	Ignored,
	/// Replace the current handler without leaving the enclosing setup scopes.
	Become(Behavior<T>),
}

impl<T> DispatchResult<T> {
	/// Returns the signal this result carries, or `None` for [`DispatchResult::Become`].
	pub fn signal(&self) -> Option<Signal> {
		match self {
			Self::Same => Some(Signal::Same),
			Self::Stop => Some(Signal::Stop),
			Self::Restart => Some(Signal::Restart),
			Self::Ignored => Some(Signal::Ignored),
			Self::Become(_) => None,
		}
	}
}

impl<T> From<Signal> for DispatchResult<T> {
	fn from(signal: Signal) -> Self {
		match signal {
			Signal::Same => Self::Same,
			Signal::Stop => Self::Stop,
			Signal::Restart => Self::Restart,
			Signal::Ignored => Self::Ignored,
		}
	}
}

impl<T> From<Behavior<T>> for DispatchResult<T> {
	fn from(behavior: Behavior<T>) -> Self {
		Self::Become(behavior)
	}
}

impl<T> std::fmt::Debug for DispatchResult<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Same => f.write_str("Same"),
			Self::Stop => f.write_str("Stop"),
			Self::Restart => f.write_str("Restart"),
			Self::Ignored => f.write_str("Ignored"),
			Self::Become(behavior) => f.debug_tuple("Become").field(behavior).finish(),
		}
	}
}

/// Why a setup scope is being exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
	/// A handler returned `Stop`.
	Stopped,
	/// The actor is about to re-run its behavior factory.
	Restarting,
	/// Every address was dropped and the mailbox drained.
	MailboxClosed,
	/// The owning scope cancelled the actor.
	Cancelled,
	/// An unsupervised error terminated the actor.
	Failed,
}

/// Lifecycle notification published by an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorEvent {
	/// An incarnation entered its behavior and is ready for messages.
	Started { generation: u64 },
	/// A handler returned `Ignored`.
	Ignored { generation: u64 },
	/// A handler returned `Restart` and a fresh incarnation is starting.
	Restarted { generation: u64 },
	/// The actor terminated.
	Stopped(ActorExit),
}
