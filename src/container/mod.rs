// src/container/mod.rs

//! Container runtime adapter.
//!
//! The controller never touches a container directly; it talks to a
//! [`ContainerRuntime`], which owns exactly one ephemeral container per
//! session. Production code uses [`DockerRuntime`] (the docker CLI); tests
//! substitute a fake that never spawns processes.
//!
//! - [`docker`] drives the container CLI through `tokio::process`.
//! - [`baseline`] derives the container name and the baseline CI environment.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::errors::{ExecutionError, SetupError};
use crate::model::{EnvMap, StepResult};

pub mod baseline;
pub mod docker;

pub use docker::DockerRuntime;

/// Boxed future returned by [`ContainerRuntime`] operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What the adapter needs to bring up the session container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSpec {
    pub job_name: String,
    pub image: String,
    /// Job-level environment, layered over the baseline CI environment.
    pub env: EnvMap,
    /// Host directory bind-mounted read-write at the workspace path.
    pub host_dir: PathBuf,
}

/// A single command to run inside the session container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub command: String,
    pub env: EnvMap,
    pub working_directory: String,
}

/// Abstract capability over one session-scoped container.
///
/// All operations may block on external IO, so callers run them off the
/// controller's control loop (see [`crate::exec::Dispatcher`]).
pub trait ContainerRuntime: Send + Sync + 'static {
    /// Pull the image if needed, replace any stale container with the same
    /// name, and start a new keep-alive container.
    fn provision(&self, spec: ProvisionSpec) -> BoxFuture<'_, Result<(), SetupError>>;

    /// Run a command under a strict shell. A non-zero exit code is an `Ok`
    /// result; `Err` means the command never reached the container.
    fn execute(&self, request: ExecRequest) -> BoxFuture<'_, Result<StepResult, ExecutionError>>;

    /// Entries of a directory inside the container. Empty on any error.
    fn list_files(&self, path: String) -> BoxFuture<'_, Vec<String>>;

    /// Environment of the container. Empty on any error.
    fn dump_environment(&self) -> BoxFuture<'_, EnvMap>;

    /// Hand the terminal to an interactive shell inside the container and
    /// resolve when that shell exits, however it exits.
    fn shell_in(&self) -> BoxFuture<'_, Result<Option<i32>, ExecutionError>>;

    /// Stop and remove the container. Idempotent; never fails.
    fn teardown(&self) -> BoxFuture<'_, ()>;

    /// Deterministic name of the session container.
    fn container_name(&self) -> &str;
}
