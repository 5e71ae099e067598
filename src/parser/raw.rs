// src/parser/raw.rs

//! `serde` mirror of a workflow document.
//!
//! Only the keys the debugger understands are modelled; everything else in
//! the document is ignored.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

#[derive(Debug, Deserialize)]
pub struct RawWorkflow {
    #[serde(default)]
    pub name: Option<String>,

    /// `on:` may be a string, a list of events, or a mapping of event configs.
    #[serde(default)]
    pub on: Option<Value>,

    #[serde(default)]
    pub env: Option<Mapping>,

    /// Job id → job. `Mapping` keeps declaration order.
    #[serde(default)]
    pub jobs: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawJob {
    /// A single label or a list of labels.
    #[serde(default, rename = "runs-on")]
    pub runs_on: Option<Value>,

    #[serde(default)]
    pub env: Option<Mapping>,

    #[serde(default)]
    pub steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
pub struct RawStep {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub uses: Option<String>,

    #[serde(default)]
    pub run: Option<String>,

    #[serde(default)]
    pub env: Option<Mapping>,

    #[serde(default, rename = "working-directory")]
    pub working_directory: Option<String>,
}
