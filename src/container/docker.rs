// src/container/docker.rs

//! [`ContainerRuntime`] backed by the docker CLI.
//!
//! Every operation shells out to the configured binary with
//! `tokio::process::Command`, so a compatible drop-in (e.g. podman) works
//! by changing `[runtime].binary`.

use std::process::{Output, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::RuntimeSection;
use crate::container::baseline::{baseline_env, container_name, probe_git};
use crate::container::{BoxFuture, ContainerRuntime, ExecRequest, ProvisionSpec};
use crate::errors::{ExecutionError, SetupError};
use crate::model::{EnvMap, StepResult, WORKSPACE_PATH};

/// Exit status the docker CLI uses for its own failures. A command run by
/// `exec` can exit with it too, so it only counts as a CLI failure once the
/// container is confirmed gone.
const CLI_FAILURE_EXIT_CODE: i32 = 125;

/// Lifecycle of the single session container.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ContainerState {
    Absent,
    /// Provisioning started; a container with our name may or may not exist.
    Provisioning,
    Ready { id: String },
}

#[derive(Debug)]
pub struct DockerRuntime {
    binary: String,
    shell: String,
    stop_timeout_secs: u64,
    name: String,
    state: Mutex<ContainerState>,
}

impl DockerRuntime {
    /// Adapter for one session of `job_name`, named after this process.
    pub fn new(settings: &RuntimeSection, job_name: &str) -> Self {
        Self {
            binary: settings.binary.clone(),
            shell: settings.shell.clone(),
            stop_timeout_secs: settings.stop_timeout_secs,
            name: container_name(&settings.container_prefix, job_name, std::process::id()),
            state: Mutex::new(ContainerState::Absent),
        }
    }

    fn state(&self) -> MutexGuard<'_, ContainerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ready_name(&self) -> Option<String> {
        match *self.state() {
            ContainerState::Ready { .. } => Some(self.name.clone()),
            _ => None,
        }
    }

    /// Run the CLI to completion, capturing both streams.
    async fn run_cli(&self, args: &[String]) -> std::io::Result<Output> {
        debug!(binary = %self.binary, ?args, "invoking container cli");
        Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
    }

    async fn provision_inner(&self, spec: ProvisionSpec) -> Result<(), SetupError> {
        let host_dir = validate_mount(&spec).await?;

        let version = self
            .run_cli(&strings(&["version", "--format", "{{.Server.Version}}"]))
            .await
            .map_err(|e| SetupError::RuntimeUnreachable(format!("failed to exec {}: {e}", self.binary)))?;
        if !version.status.success() {
            return Err(SetupError::RuntimeUnreachable(stderr_text(&version)));
        }

        *self.state() = ContainerState::Provisioning;

        self.ensure_image(&spec.image).await?;

        // A crashed earlier session may have left a container with our name.
        if let Ok(out) = self.run_cli(&strings(&["rm", "-f", &self.name])).await {
            if out.status.success() {
                debug!(container = %self.name, "removed stale container (if any)");
            }
        }

        let git = probe_git(&host_dir).await;
        let mut env = baseline_env(&git);
        env.extend(spec.env);

        let args = run_args(&self.name, &host_dir.display().to_string(), &spec.image, &env);
        let out = self
            .run_cli(&args)
            .await
            .map_err(|e| SetupError::StartFailed(e.to_string()))?;
        if !out.status.success() {
            return Err(SetupError::StartFailed(stderr_text(&out)));
        }

        let id = stdout_text(&out);
        info!(container = %self.name, %id, image = %spec.image, "container ready");
        *self.state() = ContainerState::Ready { id };
        Ok(())
    }

    async fn ensure_image(&self, image: &str) -> Result<(), SetupError> {
        let present = self
            .run_cli(&strings(&["image", "inspect", image]))
            .await
            .map(|out| out.status.success())
            .unwrap_or(false);
        if present {
            debug!(%image, "image available locally");
            return Ok(());
        }

        info!(%image, "pulling image");
        let out = self
            .run_cli(&strings(&["pull", image]))
            .await
            .map_err(|e| SetupError::ImageUnavailable {
                image: image.to_string(),
                reason: e.to_string(),
            })?;
        if !out.status.success() {
            return Err(SetupError::ImageUnavailable {
                image: image.to_string(),
                reason: stderr_text(&out),
            });
        }
        Ok(())
    }

    async fn execute_inner(&self, request: ExecRequest) -> Result<StepResult, ExecutionError> {
        let name = self.ready_name().ok_or(ExecutionError::NoContainer)?;
        let args = exec_args(&name, &self.shell, &request);

        let out = self
            .run_cli(&args)
            .await
            .map_err(|e| ExecutionError::Dispatch(format!("failed to exec {}: {e}", self.binary)))?;

        let exit_code = match out.status.code() {
            // 125 is ambiguous: the CLI failed, or the command itself exited 125.
            Some(CLI_FAILURE_EXIT_CODE) if !self.is_running(&name).await => {
                let reason = match stderr_text(&out) {
                    text if text.is_empty() => format!(
                        "{} exec failed with exit code {CLI_FAILURE_EXIT_CODE}",
                        self.binary
                    ),
                    text => text,
                };
                return Err(ExecutionError::Dispatch(reason));
            }
            Some(code) => code,
            None => {
                return Err(ExecutionError::Dispatch(format!(
                    "{} exec terminated by signal",
                    self.binary
                )));
            }
        };

        debug!(container = %name, exit_code, "command finished");
        Ok(StepResult::new(
            exit_code,
            String::from_utf8_lossy(&out.stdout),
            String::from_utf8_lossy(&out.stderr),
        ))
    }

    /// Whether the runtime still reports `name` as a running container.
    async fn is_running(&self, name: &str) -> bool {
        let args = strings(&["container", "inspect", "-f", "{{.State.Running}}", name]);
        match self.run_cli(&args).await {
            Ok(out) if out.status.success() => stdout_text(&out) == "true",
            Ok(out) => {
                debug!(container = %name, stderr = %stderr_text(&out), "container inspect failed");
                false
            }
            Err(e) => {
                debug!(container = %name, error = %e, "container inspect could not run");
                false
            }
        }
    }

    /// Run a read-only helper command; stdout on success, `None` otherwise.
    async fn probe(&self, cmd: &[&str]) -> Option<String> {
        let name = self.ready_name()?;
        let mut args = strings(&["exec", &name]);
        args.extend(strings(cmd));
        match self.run_cli(&args).await {
            Ok(out) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
            Ok(out) => {
                debug!(?cmd, stderr = %stderr_text(&out), "inspection command failed");
                None
            }
            Err(e) => {
                debug!(?cmd, error = %e, "inspection command could not run");
                None
            }
        }
    }
}

impl ContainerRuntime for DockerRuntime {
    fn provision(&self, spec: ProvisionSpec) -> BoxFuture<'_, Result<(), SetupError>> {
        Box::pin(self.provision_inner(spec))
    }

    fn execute(&self, request: ExecRequest) -> BoxFuture<'_, Result<StepResult, ExecutionError>> {
        Box::pin(self.execute_inner(request))
    }

    fn list_files(&self, path: String) -> BoxFuture<'_, Vec<String>> {
        Box::pin(async move {
            self.probe(&["ls", "-1A", &path])
                .await
                .map(|out| out.lines().filter(|l| !l.is_empty()).map(str::to_string).collect())
                .unwrap_or_default()
        })
    }

    fn dump_environment(&self) -> BoxFuture<'_, EnvMap> {
        Box::pin(async move {
            self.probe(&["env"])
                .await
                .map(|out| parse_env(&out))
                .unwrap_or_default()
        })
    }

    fn shell_in(&self) -> BoxFuture<'_, Result<Option<i32>, ExecutionError>> {
        Box::pin(async move {
            let name = self.ready_name().ok_or(ExecutionError::NoContainer)?;
            info!(container = %name, "starting interactive shell");

            // Inherited stdio: the shell owns the terminal until it exits.
            let status = Command::new(&self.binary)
                .args(["exec", "-it", name.as_str(), "sh", "-c", INTERACTIVE_SHELL])
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .map_err(|e| ExecutionError::Dispatch(format!("failed to exec {}: {e}", self.binary)))?;

            info!(container = %name, code = ?status.code(), "interactive shell exited");
            Ok(status.code())
        })
    }

    fn teardown(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let previous = std::mem::replace(&mut *self.state(), ContainerState::Absent);
            match previous {
                ContainerState::Absent => {
                    debug!(container = %self.name, "teardown: no container");
                    return;
                }
                ContainerState::Provisioning => {
                    debug!(container = %self.name, "teardown during provisioning; removing by name");
                }
                ContainerState::Ready { ref id } => {
                    debug!(container = %self.name, %id, "tearing down container");
                }
            }

            let timeout = self.stop_timeout_secs.to_string();
            if let Err(e) = self.run_cli(&strings(&["stop", "-t", &timeout, &self.name])).await {
                warn!(container = %self.name, error = %e, "stop failed; forcing removal");
            }
            match self.run_cli(&strings(&["rm", "-f", &self.name])).await {
                Ok(out) if out.status.success() => {
                    info!(container = %self.name, "container removed");
                }
                Ok(out) => {
                    debug!(container = %self.name, stderr = %stderr_text(&out), "rm reported an error (already gone?)");
                }
                Err(e) => {
                    warn!(container = %self.name, error = %e, "rm could not run");
                }
            }
        })
    }

    fn container_name(&self) -> &str {
        &self.name
    }
}

/// Prefer bash, fall back to sh for minimal images.
const INTERACTIVE_SHELL: &str = "if command -v bash >/dev/null 2>&1; then exec bash; else exec sh; fi";

async fn validate_mount(spec: &ProvisionSpec) -> Result<std::path::PathBuf, SetupError> {
    let invalid = |reason: String| SetupError::InvalidMount {
        path: spec.host_dir.display().to_string(),
        reason,
    };

    let meta = tokio::fs::metadata(&spec.host_dir)
        .await
        .map_err(|e| invalid(e.to_string()))?;
    if !meta.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    tokio::fs::canonicalize(&spec.host_dir)
        .await
        .map_err(|e| invalid(e.to_string()))
}

/// Arguments for `run`: detached keep-alive container with the workspace mounted.
fn run_args(name: &str, host_dir: &str, image: &str, env: &EnvMap) -> Vec<String> {
    let mut args = strings(&[
        "run",
        "-d",
        "--name",
        name,
        "-v",
        &format!("{host_dir}:{WORKSPACE_PATH}:rw"),
        "-w",
        WORKSPACE_PATH,
    ]);
    push_env(&mut args, env);
    args.extend(strings(&[image, "sleep", "infinity"]));
    args
}

/// Arguments for `exec`: the command under a strict shell.
fn exec_args(name: &str, shell: &str, request: &ExecRequest) -> Vec<String> {
    let mut args = strings(&["exec", "-w", &request.working_directory]);
    push_env(&mut args, &request.env);
    args.extend(strings(&[
        name,
        shell,
        "-e",
        "-u",
        "-o",
        "pipefail",
        "-c",
        &request.command,
    ]));
    args
}

fn push_env(args: &mut Vec<String>, env: &EnvMap) {
    for (key, value) in env {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
}

fn parse_env(text: &str) -> EnvMap {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn stdout_text(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn stderr_text(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).trim().to_string()
}
