// src/model/mod.rs

//! Pipeline model: the record tree produced by the workflow parser and
//! consumed by the debug controller.
//!
//! - [`pipeline`] holds `Workflow → Job → Step`, built once and never
//!   structurally mutated.
//! - [`step_state`] holds the mutable per-step state and the immutable
//!   `StepResult` produced by each execution.

pub mod pipeline;
pub mod step_state;

pub use pipeline::{Job, Step, Workflow};
pub use step_state::{StepResult, StepState};

/// Canonical in-container path at which the host working directory is mounted.
pub const WORKSPACE_PATH: &str = "/workspace";

/// Environment mapping. Sorted so rendering and container arguments are stable.
pub type EnvMap = std::collections::BTreeMap<String, String>;
