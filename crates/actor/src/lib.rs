#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Typed behavior actors on tokio.
//!
//! An actor is a [`Behavior`] running on its own task, handling one message
//! at a time from a rendezvous mailbox. Handlers answer every message with a
//! [`DispatchResult`]: keep going (`Same`), `Stop`, `Restart` from the
//! behavior factory, report the message as `Ignored`, or `Become` a new
//! behavior. [`Behaviors::setup`] scopes resources to an incarnation,
//! [`Behaviors::supervise`] turns handler errors into signals, and every actor
//! belongs to a [`Scope`] that cancels and joins it.
//!
//! ```ignore
//! let seen = strand_actor::scope::open("main", |scope| async move {
//!     let printer = scope.spawn("printer", || {
//!         Behaviors::receive(|msg: String| async move {
//!             println!("{msg}");
//!             Ok(Signal::Same.into())
//!         })
//!     })?;
//!     printer.send("hello".to_string()).await
//! })
//! .await;
//! ```

mod address;
mod behavior;
mod context;
mod error;
mod mailbox;
mod processor;
pub mod scope;
mod signal;
mod spec;
mod token;

pub use address::{ActorEventReceiver, Address, WeakAddress};
pub use async_trait::async_trait;
pub use behavior::{Behavior, BehaviorHandler, BehaviorSetup, Behaviors, Scoped, SuperviseStrategy, TypeCheck};
pub use context::ActorContext;
pub use error::{ActorError, ActorExit, ActorExitKind};
pub use scope::{FailurePolicy, Scope};
pub use signal::{ActorEvent, DispatchResult, ExitReason, Signal};
pub use spec::ActorSpec;
