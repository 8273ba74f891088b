//! Presence Reconciler
//!
//! Turns a chronologically-ordered run of switch events into per-member
//! `lastIn`/`lastOut` history. `reconcile` is the pure incremental diff;
//! `rebuild_history` drives it backward over the entire remote ledger for
//! cold starts.

pub mod rebuild;
pub mod reconcile;

pub use rebuild::{rebuild_history, SourceError, SwitchSource};
pub use reconcile::{reconcile, seed_roster};
