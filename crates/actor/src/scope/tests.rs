use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use super::*;
use crate::{ActorExitKind, Behaviors, DispatchResult, Scoped};

/// Actor that idles until cancelled and flags its teardown after a short delay.
fn slow_teardown(done: Arc<AtomicBool>) -> impl Fn() -> Behavior<()> + Send + Sync + 'static {
	teardown_taking(Duration::from_millis(30), done)
}

fn teardown_taking(delay: Duration, done: Arc<AtomicBool>) -> impl Fn() -> Behavior<()> + Send + Sync + 'static {
	move || {
		let done = Arc::clone(&done);
		Behaviors::setup(move |_ctx| async move {
			Ok(Scoped::new(Behaviors::receive(|_msg: ()| async { Ok(DispatchResult::Same) })).on_exit(move |_reason| async move {
				tokio::time::sleep(delay).await;
				done.store(true, Ordering::SeqCst);
			}))
		})
	}
}

async fn explode(_msg: ()) -> anyhow::Result<DispatchResult<()>> {
	anyhow::bail!("handler exploded")
}

async fn panic_on_message(_msg: ()) -> anyhow::Result<DispatchResult<()>> {
	panic!("boom")
}

fn failing() -> Behavior<()> {
	Behaviors::receive(explode)
}

#[tokio::test]
async fn stop_waits_for_teardown() {
	let scope = Scope::new("teardown");
	let done = Arc::new(AtomicBool::new(false));
	let addr = scope.spawn("slow", slow_teardown(Arc::clone(&done))).expect("spawn");
	addr.send(()).await.expect("setup entered");

	tokio::time::timeout(Duration::from_secs(1), scope.stop()).await.expect("stop completes");
	assert!(done.load(Ordering::SeqCst));

	let exits = scope.exits();
	assert_eq!(exits.len(), 1);
	assert_eq!(exits[0].actor(), "slow");
	assert_eq!(exits[0].kind(), ActorExitKind::Cancelled);
}

#[tokio::test]
async fn spawn_after_stop_is_refused() {
	let scope = Scope::new("closed");
	scope.stop().await;
	assert!(scope.is_closed());

	let err = scope.spawn("late", failing).expect_err("scope is closed");
	assert_eq!(err, ActorError::ScopeClosed { scope: "closed".to_string() });
}

#[tokio::test]
async fn concurrent_stops_all_wait_for_children() {
	let scope = Scope::new("concurrent");
	let done = Arc::new(AtomicBool::new(false));
	let addr = scope.spawn("slow", slow_teardown(Arc::clone(&done))).expect("spawn");
	addr.send(()).await.expect("setup entered");

	let other = scope.clone();
	let first = async {
		scope.stop().await;
		done.load(Ordering::SeqCst)
	};
	let second = async {
		other.stop().await;
		done.load(Ordering::SeqCst)
	};
	let (first, second) = tokio::time::timeout(Duration::from_secs(1), async { tokio::join!(first, second) })
		.await
		.expect("both stops complete");
	assert!(first && second);

	// Stopping again is a no-op.
	scope.stop().await;
	assert_eq!(scope.exits().len(), 1);
}

#[tokio::test]
async fn abandoned_stop_does_not_release_later_stops() {
	let scope = Scope::new("abandoned");
	let done = Arc::new(AtomicBool::new(false));
	let addr = scope.spawn("slow", teardown_taking(Duration::from_millis(200), Arc::clone(&done))).expect("spawn");
	addr.send(()).await.expect("setup entered");

	assert!(tokio::time::timeout(Duration::from_millis(10), scope.clone().stop()).await.is_err());
	assert!(!done.load(Ordering::SeqCst));
	assert_eq!(scope.running(), 1);

	tokio::time::timeout(Duration::from_secs(2), scope.stop()).await.expect("stop completes");
	assert!(done.load(Ordering::SeqCst));
	assert_eq!(scope.running(), 0);
	assert_eq!(scope.exits().len(), 1);
}

#[tokio::test]
async fn finished_actors_are_released() {
	let scope = Scope::new("churn");
	let total = EXIT_HISTORY + 16;
	for n in 0..total {
		let addr = scope.spawn(format!("short-{n}"), || Behaviors::receive(|_msg: ()| async { Ok(DispatchResult::Stop) })).expect("spawn");
		addr.send(()).await.expect("actor takes the message");
	}

	tokio::time::timeout(Duration::from_secs(5), async {
		while scope.running() > 0 {
			tokio::time::sleep(Duration::from_millis(1)).await;
		}
	})
	.await
	.expect("finished actors leave the scope");
	assert!(!scope.is_closed());

	let exits = scope.exits();
	assert_eq!(exits.len(), EXIT_HISTORY);
	let names: std::collections::HashSet<_> = exits.iter().map(|exit| exit.actor().to_string()).collect();
	assert_eq!(names.len(), EXIT_HISTORY);
	assert!(exits.iter().all(|exit| exit.kind() == ActorExitKind::Stopped));

	scope.stop().await;
}

#[tokio::test]
async fn isolate_keeps_siblings_running() {
	let _ = tracing_subscriber::fmt::try_init();
	let scope = Scope::new("isolate");
	let fragile = scope.spawn("fragile", failing).expect("spawn");
	let sibling = scope.spawn("sibling", || Behaviors::receive(|_msg: ()| async { Ok(DispatchResult::Same) })).expect("spawn");

	fragile.send(()).await.expect("fragile takes the message");
	fragile.closed().await;

	sibling.send(()).await.expect("sibling unaffected");
	assert!(!scope.is_closed());

	scope.stop().await;
	let failures = scope.failures();
	assert_eq!(failures.len(), 1);
	assert_eq!(failures[0].actor(), "fragile");
	assert_eq!(failures[0].message(), Some("handler exploded"));
}

#[tokio::test]
async fn stop_all_cancels_siblings_on_failure() {
	let scope = Scope::with_policy("stop-all", FailurePolicy::StopAll);
	let done = Arc::new(AtomicBool::new(false));
	let fragile = scope.spawn("fragile", failing).expect("spawn");
	let sibling = scope.spawn("sibling", slow_teardown(Arc::clone(&done))).expect("spawn");
	sibling.send(()).await.expect("setup entered");

	fragile.send(()).await.expect("fragile takes the message");
	tokio::time::timeout(Duration::from_secs(1), sibling.closed()).await.expect("sibling cancelled");
	assert!(scope.is_closed());
	assert!(scope.spawn("late", failing).is_err());

	scope.join().await;
	assert!(done.load(Ordering::SeqCst));
	let mut kinds: Vec<_> = scope.exits().iter().map(|exit| (exit.actor().to_string(), exit.kind())).collect();
	kinds.sort_by(|a, b| a.0.cmp(&b.0));
	assert_eq!(
		kinds,
		vec![("fragile".to_string(), ActorExitKind::HandlerFailed), ("sibling".to_string(), ActorExitKind::Cancelled)]
	);
}

#[tokio::test]
async fn panicking_handler_is_recorded() {
	let scope = Scope::new("panics");
	let addr = scope.spawn("panicky", || Behaviors::receive(panic_on_message)).expect("spawn");

	addr.send(()).await.expect("actor takes the message");
	addr.closed().await;
	scope.stop().await;

	let failures = scope.failures();
	assert_eq!(failures.len(), 1);
	assert_eq!(failures[0].actor(), "panicky");
	assert_eq!(failures[0].kind(), ActorExitKind::Panicked);
	assert_eq!(failures[0].message(), Some("boom"));
}

#[tokio::test]
async fn join_returns_once_addresses_are_dropped() {
	let scope = Scope::new("join");
	let first = scope.spawn_spec(ActorSpec::new(|| Behaviors::receive(|_msg: u8| async { Ok(DispatchResult::Same) }))).expect("spawn");
	let second = scope.spawn_spec(ActorSpec::new(|| Behaviors::receive(|_msg: u8| async { Ok(DispatchResult::Same) }))).expect("spawn");
	assert_eq!(first.name(), "join/1");
	assert_eq!(second.name(), "join/2");

	first.send(1).await.expect("alive");
	drop(first);
	drop(second);

	tokio::time::timeout(Duration::from_secs(1), scope.join()).await.expect("join completes");
	let exits = scope.exits();
	assert_eq!(exits.len(), 2);
	assert!(exits.iter().all(|exit| exit.kind() == ActorExitKind::MailboxClosed));
	assert!(scope.failures().is_empty());
}

#[tokio::test]
async fn open_stops_the_scope_before_returning() {
	let done = Arc::new(AtomicBool::new(false));
	let factory = slow_teardown(Arc::clone(&done));

	let name = open("open", |scope| async move {
		let addr = scope.spawn("slow", factory)?;
		addr.send(()).await?;
		Ok::<_, ActorError>(addr.name().to_string())
	})
	.await
	.expect("body succeeds");

	assert_eq!(name, "slow");
	assert!(done.load(Ordering::SeqCst));
}

#[tokio::test]
async fn dropped_scope_still_runs_teardown() {
	let (tx, rx) = oneshot::channel();
	let tx = Arc::new(Mutex::new(Some(tx)));
	let scope = Scope::new("dropped");
	let addr = scope
		.spawn("orphan", move || {
			let tx = Arc::clone(&tx);
			Behaviors::setup(move |_ctx| async move {
				Ok(Scoped::new(Behaviors::receive(|_msg: ()| async { Ok(DispatchResult::Same) })).on_exit(move |reason| async move {
					if let Some(tx) = tx.lock().expect("lock").take() {
						let _ = tx.send(reason);
					}
				}))
			})
		})
		.expect("spawn");
	addr.send(()).await.expect("alive");

	drop(scope);
	let reason = tokio::time::timeout(Duration::from_secs(1), rx).await.expect("teardown ran").expect("reason sent");
	assert_eq!(reason, crate::ExitReason::Cancelled);
}

#[tokio::test]
async fn child_scopes_stop_after_parent_teardown() {
	let log = Arc::new(Mutex::new(Vec::new()));
	let worker_slot: Arc<Mutex<Option<Address<()>>>> = Arc::new(Mutex::new(None));
	let scope = Scope::new("tree");
	let factory_log = Arc::clone(&log);
	let factory_slot = Arc::clone(&worker_slot);
	let parent = scope
		.spawn("parent", move || {
			let log = Arc::clone(&factory_log);
			let slot = Arc::clone(&factory_slot);
			Behaviors::setup(move |ctx| async move {
				let workers = ctx.child_scope("workers");
				assert_eq!(workers.name(), "parent/workers");
				let child_log = Arc::clone(&log);
				let worker = workers.spawn("worker", move || {
					let log = Arc::clone(&child_log);
					Behaviors::setup(move |_ctx| async move {
						Ok(Scoped::new(Behaviors::receive(|_msg: ()| async { Ok(DispatchResult::Same) })).on_exit(move |reason| async move {
							log.lock().expect("lock").push(format!("worker:{reason:?}"));
						}))
					})
				})?;
				// The worker must have entered its setup before the parent can be torn down.
				worker.send(()).await?;
				*slot.lock().expect("lock") = Some(worker);
				Ok(Scoped::new(Behaviors::receive(|_msg: ()| async { Ok(DispatchResult::Stop) })).on_exit(move |reason| async move {
					log.lock().expect("lock").push(format!("parent:{reason:?}"));
				}))
			})
		})
		.expect("spawn");

	parent.send(()).await.expect("alive");
	scope.join().await;

	assert_eq!(*log.lock().expect("lock"), vec!["parent:Stopped".to_string(), "worker:Cancelled".to_string()]);
	let worker = worker_slot.lock().expect("lock").take().expect("worker spawned");
	assert!(worker.send(()).await.is_err());
}
