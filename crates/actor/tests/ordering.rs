#![allow(unused_crate_dependencies)]
//! Message ordering properties.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use strand_actor::{Behaviors, DispatchResult, Scope};

fn deliver(messages: Vec<u16>, nowait: bool) -> Vec<u16> {
	let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().expect("runtime");
	runtime.block_on(async move {
		let scope = Scope::new("ordering");
		let seen = Arc::new(Mutex::new(Vec::new()));
		let log = Arc::clone(&seen);
		let addr = scope
			.spawn("collector", move || {
				let log = Arc::clone(&log);
				Behaviors::receive(move |n: u16| {
					let log = Arc::clone(&log);
					async move {
						log.lock().expect("lock").push(n);
						Ok(DispatchResult::Same)
					}
				})
			})
			.expect("spawn");

		for n in messages {
			if nowait {
				addr.send_nowait(n);
			} else {
				addr.send(n).await.expect("actor alive");
			}
		}
		drop(addr);
		scope.join().await;

		let seen = seen.lock().expect("lock").clone();
		seen
	})
}

proptest! {
	/// Awaited sends from one sender are handled in send order.
	#[test]
	fn prop_send_preserves_order(messages in proptest::collection::vec(any::<u16>(), 0..64)) {
		prop_assert_eq!(deliver(messages.clone(), false), messages);
	}

	/// Fire-and-forget sends are all delivered, in queue order.
	#[test]
	fn prop_send_nowait_preserves_order(messages in proptest::collection::vec(any::<u16>(), 0..64)) {
		prop_assert_eq!(deliver(messages.clone(), true), messages);
	}
}
