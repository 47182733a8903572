//! Error and exit types shared by behaviors, processors and scopes.

use thiserror::Error;

/// Errors raised by the actor runtime itself.
///
/// Handler bodies return [`anyhow::Error`]; runtime failures that happen
/// inside a dispatch (such as [`ActorError::TypeMismatch`]) travel through
/// that error and can be recovered with [`anyhow::Error::downcast_ref`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActorError {
	/// A message failed the handler's runtime type check.
	#[error("can only handle messages of type {expected}")]
	TypeMismatch {
		/// Description of the accepted message type.
		expected: &'static str,
	},

	/// A behavior combinator was applied to an unsupported behavior.
	#[error("precondition failed: {0}")]
	Precondition(String),

	/// The target actor no longer accepts messages.
	#[error("mailbox of actor '{actor}' is closed")]
	MailboxClosed {
		/// Name of the target actor.
		actor: String,
	},

	/// The scope is stopping and refuses new children.
	#[error("scope '{scope}' is closed")]
	ScopeClosed {
		/// Name of the scope.
		scope: String,
	},
}

/// Opaque exit classification for public consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActorExitKind {
	/// A handler returned `Stop`.
	Stopped,
	/// Every address was dropped and the mailbox drained.
	MailboxClosed,
	/// The owning scope cancelled the actor.
	Cancelled,
	/// A setup initializer failed.
	StartupFailed,
	/// An unsupervised handler error terminated the actor.
	HandlerFailed,
	/// The actor task panicked.
	Panicked,
	/// The actor task could not be joined.
	JoinFailed,
}

/// Exit summary for one actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorExit {
	actor: String,
	kind: ActorExitKind,
	message: Option<String>,
}

impl ActorExit {
	pub(crate) fn new(actor: impl Into<String>, reason: &ActorExitReason) -> Self {
		let (kind, message) = match reason {
			ActorExitReason::Stopped => (ActorExitKind::Stopped, None),
			ActorExitReason::MailboxClosed => (ActorExitKind::MailboxClosed, None),
			ActorExitReason::Cancelled => (ActorExitKind::Cancelled, None),
			ActorExitReason::StartupFailed(msg) => (ActorExitKind::StartupFailed, Some(msg.clone())),
			ActorExitReason::HandlerFailed(msg) => (ActorExitKind::HandlerFailed, Some(msg.clone())),
			ActorExitReason::Panicked(msg) => (ActorExitKind::Panicked, msg.clone()),
			ActorExitReason::JoinFailed(msg) => (ActorExitKind::JoinFailed, Some(msg.clone())),
		};
		Self {
			actor: actor.into(),
			kind,
			message,
		}
	}

	/// Name of the actor that exited.
	pub fn actor(&self) -> &str {
		&self.actor
	}

	pub fn kind(&self) -> ActorExitKind {
		self.kind
	}

	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}

	pub fn is_failure(&self) -> bool {
		matches!(
			self.kind,
			ActorExitKind::StartupFailed | ActorExitKind::HandlerFailed | ActorExitKind::Panicked | ActorExitKind::JoinFailed
		)
	}
}

/// Exit reason for one actor task, carrying error payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ActorExitReason {
	Stopped,
	MailboxClosed,
	Cancelled,
	StartupFailed(String),
	HandlerFailed(String),
	Panicked(Option<String>),
	JoinFailed(String),
}

/// Extracts the panic message from a failed task join, if it panicked.
pub(crate) fn join_error_panic_message(err: tokio::task::JoinError) -> Option<String> {
	if !err.is_panic() {
		return None;
	}
	let payload = err.into_panic();
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return Some((*msg).to_string());
	}
	if let Some(msg) = payload.downcast_ref::<String>() {
		return Some(msg.clone());
	}
	Some("non-string panic payload".to_string())
}
