#![forbid(unsafe_code)]

//! Match tracking runtime over the scoring kernel.
//!
//! Wraps the pure kernel with the append-only event log, replay,
//! round segmentation, statistics, the snapshot contract and the
//! tracking session with its persistence-collaborator seam.
//!
//! No rule logic lives here — all transitions and invariants are
//! delegated to the kernel.

pub mod event_log;
pub mod replay;
pub mod rounds;
pub mod stats;
pub mod snapshot;
pub mod session;
pub mod drift;
