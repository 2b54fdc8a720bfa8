//! Session orchestration for the Sprout idle farm.
//!
//! This crate wires the synchronous farm rules from `sprout-world` to time,
//! identity, and persistence:
//!
//! ```text
//! 1s interval --> Session::tick --> growth::tick --> SaveScheduler::on_change
//!                                                         |
//! login --> Session::start --> store.get --> reconcile    +--> store.set
//! ```
//!
//! # Modules
//!
//! - [`clock`] -- Wall-clock abstraction and the whole-second tick source.
//! - [`config`] -- Configuration loading from `sprout-config.yaml` into
//!   strongly-typed structs.
//! - [`identity`] -- Current user with change notifications.
//! - [`scheduler`] -- The save scheduler state machine.
//! - [`session`] -- One logged-in user's farm and its persistence.
//! - [`runner`] -- The async loop driving sessions from ticks, identity
//!   changes, and player commands.

pub mod clock;
pub mod config;
pub mod identity;
pub mod runner;
pub mod scheduler;
pub mod session;
