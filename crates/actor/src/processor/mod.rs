//! Per-actor execution loop.
//!
//! A processor owns the mailbox receiver and drives one actor through its
//! incarnations. Each incarnation enters the behavior produced by the
//! factory, dispatches messages one at a time, and releases its setup scopes
//! when it ends. `Restart` starts the next incarnation on the same mailbox;
//! every other ending terminates the actor.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::address::WeakAddress;
use crate::behavior::{Behavior, BehaviorHandler, BehaviorSetup};
use crate::context::ActorContext;
use crate::error::ActorExitReason;
use crate::mailbox::MailboxReceiver;
use crate::signal::{ActorEvent, DispatchResult, ExitReason};
use crate::spec::BehaviorFactory;
use crate::token::GenerationToken;

/// How one incarnation ended.
#[derive(Debug)]
enum RunEnd {
	Restart,
	Exit(ActorExitReason),
}

impl ActorExitReason {
	fn teardown_reason(&self) -> ExitReason {
		match self {
			Self::Stopped => ExitReason::Stopped,
			Self::MailboxClosed => ExitReason::MailboxClosed,
			Self::Cancelled => ExitReason::Cancelled,
			Self::StartupFailed(_) | Self::HandlerFailed(_) | Self::Panicked(_) | Self::JoinFailed(_) => ExitReason::Failed,
		}
	}
}

/// Active state of one incarnation: entered setup scopes plus the current handler.
struct Incarnation<T> {
	ctx: ActorContext<T>,
	setups: Vec<Box<dyn BehaviorSetup<T>>>,
	handler: Option<Box<dyn BehaviorHandler<T>>>,
}

impl<T> Incarnation<T>
where
	T: Send + 'static,
{
	fn new(ctx: ActorContext<T>) -> Self {
		Self {
			ctx,
			setups: Vec::new(),
			handler: None,
		}
	}

	/// Makes `behavior` current, entering any setup scopes it wraps.
	///
	/// Entered setups are stacked so they are released innermost first. A
	/// setup whose `enter` fails is not stacked and gets no `exit`.
	async fn activate(&mut self, behavior: Behavior<T>) -> anyhow::Result<()> {
		let mut next = behavior;
		loop {
			match next {
				Behavior::Receive(handler) => {
					self.handler = Some(handler);
					return Ok(());
				}
				Behavior::Setup(mut setup) => {
					let inner = setup.enter(self.ctx.clone()).await?;
					self.setups.push(setup);
					next = inner;
				}
			}
		}
	}

	/// Runs every pending teardown, then joins the scopes opened through the context.
	async fn release(&mut self, reason: ExitReason) {
		self.handler = None;
		while let Some(mut setup) = self.setups.pop() {
			setup.exit(reason).await;
		}
		for scope in self.ctx.take_child_scopes() {
			scope.stop().await;
		}
	}
}

/// Execution loop for one actor.
pub(crate) struct Processor<T> {
	name: Arc<str>,
	factory: Arc<BehaviorFactory<T>>,
	max_restarts: Option<usize>,
	rx: MailboxReceiver<T>,
	events: broadcast::Sender<ActorEvent>,
	cancel: CancellationToken,
	myself: WeakAddress<T>,
}

impl<T> Processor<T>
where
	T: Send + 'static,
{
	pub(crate) fn new(
		name: Arc<str>,
		factory: Arc<BehaviorFactory<T>>,
		max_restarts: Option<usize>,
		rx: MailboxReceiver<T>,
		events: broadcast::Sender<ActorEvent>,
		cancel: CancellationToken,
		myself: WeakAddress<T>,
	) -> Self {
		Self {
			name,
			factory,
			max_restarts,
			rx,
			events,
			cancel,
			myself,
		}
	}

	/// Runs incarnations until the actor terminates.
	pub(crate) async fn run(mut self) -> ActorExitReason {
		let mut restarts = 0usize;
		let mut generation = 0u64;

		let reason = loop {
			generation += 1;
			let token = GenerationToken::new(generation, self.cancel.child_token());
			if restarts > 0 {
				let _ = self.events.send(ActorEvent::Restarted { generation });
			}

			let ctx = ActorContext::new(Arc::clone(&self.name), token.clone(), self.myself.clone());
			let mut incarnation = Incarnation::new(ctx);
			let behavior = (self.factory)();

			// Cancel-aware startup: preempt setup initializers if the scope stops.
			let started = tokio::select! {
				biased;
				_ = token.cancelled() => Err(ActorExitReason::Cancelled),
				res = incarnation.activate(behavior) => res.map_err(|err| {
					let message = format!("{err:#}");
					tracing::error!(actor = %self.name, generation, error = %message, "actor setup failed");
					ActorExitReason::StartupFailed(message)
				}),
			};

			let end = match started {
				Ok(()) => {
					tracing::debug!(actor = %self.name, generation, "actor.started");
					let _ = self.events.send(ActorEvent::Started { generation });
					self.process(&mut incarnation, &token).await
				}
				Err(reason) => RunEnd::Exit(reason),
			};

			let end = match (end, self.max_restarts) {
				(RunEnd::Restart, Some(max)) if restarts >= max => {
					tracing::error!(actor = %self.name, max_restarts = max, "actor restart limit exceeded");
					RunEnd::Exit(ActorExitReason::HandlerFailed(format!("restart limit of {max} exceeded")))
				}
				(end, _) => end,
			};

			let teardown = match &end {
				RunEnd::Restart => ExitReason::Restarting,
				RunEnd::Exit(reason) => {
					// No new sends once the actor is going away, even while teardown runs.
					self.rx.close();
					reason.teardown_reason()
				}
			};
			incarnation.release(teardown).await;
			token.cancel();

			match end {
				RunEnd::Restart => {
					restarts += 1;
					tracing::debug!(actor = %self.name, generation, restarts, "actor.restart");
				}
				RunEnd::Exit(reason) => break reason,
			}
		};

		tracing::debug!(actor = %self.name, restarts, reason = ?reason, "actor.exit");
		reason
	}

	/// Dispatches messages to the current handler until the incarnation ends.
	async fn process(&mut self, incarnation: &mut Incarnation<T>, token: &GenerationToken) -> RunEnd {
		let generation = token.generation();
		loop {
			// Cancel-aware recv: preempt if the scope stops while waiting for mail.
			let msg = tokio::select! {
				biased;
				_ = token.cancelled() => return RunEnd::Exit(ActorExitReason::Cancelled),
				msg = self.rx.recv() => {
					let Some(msg) = msg else {
						return RunEnd::Exit(ActorExitReason::MailboxClosed);
					};
					msg
				}
			};

			let Some(handler) = incarnation.handler.as_mut() else {
				return RunEnd::Exit(ActorExitReason::HandlerFailed("no active handler".to_string()));
			};

			// Cancel-aware handle: preempt long-running handlers.
			let result = tokio::select! {
				biased;
				_ = token.cancelled() => return RunEnd::Exit(ActorExitReason::Cancelled),
				res = handler.handle(msg) => res,
			};

			match result {
				Ok(DispatchResult::Same) => {}
				Ok(DispatchResult::Ignored) => {
					tracing::debug!(actor = %self.name, generation, "actor.message.ignored");
					let _ = self.events.send(ActorEvent::Ignored { generation });
				}
				Ok(DispatchResult::Stop) => return RunEnd::Exit(ActorExitReason::Stopped),
				Ok(DispatchResult::Restart) => return RunEnd::Restart,
				Ok(DispatchResult::Become(next)) => {
					let entered = tokio::select! {
						biased;
						_ = token.cancelled() => return RunEnd::Exit(ActorExitReason::Cancelled),
						res = incarnation.activate(next) => res,
					};
					if let Err(err) = entered {
						let message = format!("{err:#}");
						tracing::error!(actor = %self.name, generation, error = %message, "actor setup failed");
						return RunEnd::Exit(ActorExitReason::StartupFailed(message));
					}
				}
				Err(err) => {
					let message = format!("{err:#}");
					tracing::error!(actor = %self.name, generation, error = %message, "actor handler failed");
					return RunEnd::Exit(ActorExitReason::HandlerFailed(message));
				}
			}
		}
	}
}
