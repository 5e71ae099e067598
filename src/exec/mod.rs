// src/exec/mod.rs

//! Execution dispatcher.
//!
//! The controller decides *what* runs; this module decides *where*: each
//! container operation runs as its own Tokio task and reports back to the
//! controller through a `RuntimeEvent`.
//!
//! - [`dispatcher`] owns the in-flight task set and the event sender.

pub mod dispatcher;

pub use dispatcher::Dispatcher;
