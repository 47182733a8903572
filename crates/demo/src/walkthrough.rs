//! The runnable walkthroughs behind each subcommand.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use strand_actor::{ActorContext, ActorEvent, ActorSpec, Behavior, Behaviors, DispatchResult, Scope, Scoped, SuperviseStrategy, async_trait};
use tracing::{debug, info, warn};

/// Prints every message it receives.
struct Printer {
	printed: Arc<AtomicU32>,
}

#[async_trait]
impl strand_actor::BehaviorHandler<String> for Printer {
	async fn handle(&mut self, msg: String) -> anyhow::Result<DispatchResult<String>> {
		let n = self.printed.fetch_add(1, Ordering::SeqCst) + 1;
		println!("[{n}] {msg}");
		Ok(DispatchResult::Same)
	}
}

/// Spawns one receive actor and sends it `count` greetings.
pub async fn receive(count: u32) -> anyhow::Result<()> {
	let printed = Arc::new(AtomicU32::new(0));
	let factory_printed = Arc::clone(&printed);

	strand_actor::scope::open("receive", |scope| async move {
		let printer = scope.spawn("printer", move || {
			Behavior::<String>::from_handler(Printer {
				printed: Arc::clone(&factory_printed),
			})
		})?;
		for n in 1..=count {
			printer.send(format!("hello #{n}")).await?;
		}
		drop(printer);
		scope.join().await;
		anyhow::Ok(())
	})
	.await?;

	info!(printed = printed.load(Ordering::SeqCst), "receive walkthrough done");
	Ok(())
}

/// Messages understood by the setup walkthrough's parent actor.
#[derive(Debug)]
enum Job {
	Work(u32),
	Finish,
}

fn coordinator(total: Arc<AtomicU64>) -> Behavior<Job> {
	Behaviors::setup(move |ctx: ActorContext<Job>| async move {
		info!(actor = ctx.name(), generation = ctx.generation(), "coordinator.enter");
		let workers = ctx.child_scope("workers");
		let worker = workers.spawn("summer", move || {
			let total = Arc::clone(&total);
			Behaviors::receive(move |n: u32| {
				let total = Arc::clone(&total);
				async move {
					total.fetch_add(u64::from(n), Ordering::SeqCst);
					debug!(n, "summer.add");
					Ok(DispatchResult::Same)
				}
			})
		})?;

		let handler = Behaviors::logged(Behaviors::receive(move |job: Job| {
			let worker = worker.clone();
			async move {
				match job {
					Job::Work(n) => {
						worker.send(n).await?;
						Ok(DispatchResult::Same)
					}
					Job::Finish => Ok(DispatchResult::Stop),
				}
			}
		}))?;

		Ok(Scoped::new(handler).on_exit(|reason| async move {
			info!(?reason, "coordinator.exit");
		}))
	})
}

/// Runs a setup actor that forwards work to a worker in its child scope.
pub async fn setup(count: u32) -> anyhow::Result<()> {
	let total = Arc::new(AtomicU64::new(0));
	let scope = Scope::new("setup");
	let factory_total = Arc::clone(&total);
	let parent = scope.spawn("coordinator", move || coordinator(Arc::clone(&factory_total)))?;

	for n in 1..=count {
		parent.send(Job::Work(n)).await?;
	}
	parent.send(Job::Finish).await?;
	scope.join().await;

	if parent.send(Job::Work(0)).await.is_err() {
		info!("coordinator no longer accepts work");
	}
	info!(total = total.load(Ordering::SeqCst), "setup walkthrough done");
	Ok(())
}

/// Runs a supervised actor that fails on every third message.
pub async fn supervise(count: u32, strategy: SuperviseStrategy, max_restarts: Option<usize>) -> anyhow::Result<()> {
	let handled = Arc::new(AtomicU32::new(0));
	let failed = Arc::new(AtomicU32::new(0));
	let scope = Scope::new("supervise");

	let factory_handled = Arc::clone(&handled);
	let factory_failed = Arc::clone(&failed);
	let mut spec = ActorSpec::new(move || {
		let handled = Arc::clone(&factory_handled);
		let failed = Arc::clone(&factory_failed);
		Behaviors::setup(move |_ctx: ActorContext<u32>| async move {
			let behavior = Behaviors::receive(move |n: u32| {
				let handled = Arc::clone(&handled);
				async move {
					if n % 3 == 0 {
						anyhow::bail!("message {n} is divisible by three");
					}
					handled.fetch_add(1, Ordering::SeqCst);
					Ok(DispatchResult::Same)
				}
			});
			let supervised = Behaviors::supervise(
				move |err| {
					let failed = Arc::clone(&failed);
					async move {
						failed.fetch_add(1, Ordering::SeqCst);
						warn!(error = %err, ?strategy, "supervisor.failure");
						Ok(strategy)
					}
				},
				behavior,
			)?;
			Ok(Scoped::new(supervised))
		})
	})
	.name("resilient");
	if let Some(max) = max_restarts {
		spec = spec.max_restarts(max);
	}

	let addr = scope.spawn_spec(spec)?;
	let mut events = addr.subscribe();
	let watcher = tokio::spawn(async move {
		let mut restarts = 0u32;
		while let Ok(event) = events.recv().await {
			match event {
				ActorEvent::Restarted { generation } => {
					restarts += 1;
					debug!(generation, "resilient.restarted");
				}
				ActorEvent::Stopped(exit) => {
					info!(kind = ?exit.kind(), "resilient.stopped");
					break;
				}
				_ => {}
			}
		}
		restarts
	});

	let mut delivered = 0u32;
	for n in 1..=count {
		if addr.send(n).await.is_err() {
			warn!(n, "resilient actor is gone, not sending the rest");
			break;
		}
		delivered += 1;
	}
	drop(addr);
	scope.join().await;
	let restarts = watcher.await?;

	info!(
		delivered,
		handled = handled.load(Ordering::SeqCst),
		failed = failed.load(Ordering::SeqCst),
		restarts,
		"supervise walkthrough done"
	);
	Ok(())
}
