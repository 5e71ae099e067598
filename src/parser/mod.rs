// src/parser/mod.rs

//! Workflow parser: GitHub-Actions-style YAML → [`Workflow`](crate::model::Workflow).
//!
//! - [`raw`] mirrors the YAML document with `serde` types.
//! - [`images`] maps `runs-on` labels to local container images.
//! - [`loader`] reads files and normalises the raw document into the model,
//!   collecting non-fatal warnings along the way.

pub mod images;
pub mod loader;
pub mod raw;

pub use images::{FALLBACK_IMAGE, ImageMap};
pub use loader::{ParsedWorkflow, parse_file, parse_str};
