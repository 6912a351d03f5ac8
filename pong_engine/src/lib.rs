#![forbid(unsafe_code)]

//! Deterministic scoring kernel for live beer-pong match tracking.
//!
//! The kernel is a pure transition system: an ordered stream of throw
//! actions folded over a zero state. No I/O, no clocks, no floats in
//! anything that gets hashed. Derived views (rounds, statistics,
//! snapshots, sessions) live in the runtime crate.

/// Bumped on any behavioral change to the transition rules.
pub const ENGINE_VERSION: u32 = 1;

pub mod domain;
pub mod events;
pub mod state;
pub mod transitions;
pub mod invariants;
pub mod hashing;
pub mod engine;
