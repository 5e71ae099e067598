use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use pipestep::container::{BoxFuture, ContainerRuntime, ExecRequest, ProvisionSpec};
use pipestep::errors::{ExecutionError, SetupError};
use pipestep::model::{EnvMap, StepResult};

/// What a scripted command does when executed.
#[derive(Debug, Clone)]
pub enum Scripted {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
        delay: Option<Duration>,
    },
    /// The command never reaches the container.
    DispatchError(String),
}

impl Scripted {
    pub fn ok(stdout: &str) -> Self {
        Self::exit(0, stdout, "")
    }

    pub fn exit(code: i32, stdout: &str, stderr: &str) -> Self {
        Scripted::Exit {
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            delay: None,
        }
    }

    /// Succeeds after `delay` (for exercising commands issued mid-run).
    pub fn slow(delay: Duration) -> Self {
        Scripted::Exit {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
            delay: Some(delay),
        }
    }
}

/// A container runtime that never spawns processes:
/// - provisioning succeeds (or fails with a scripted error)
/// - commands exit 0 unless scripted otherwise (per command text, in order;
///   the last scripted outcome repeats)
/// - every call is recorded for assertions.
#[derive(Debug, Default)]
pub struct FakeContainerRuntime {
    setup_error: Mutex<Option<SetupError>>,
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    env: Mutex<EnvMap>,
    files: Mutex<Vec<String>>,
    shell_exit: Mutex<Option<i32>>,

    ready: AtomicBool,
    provisions: Mutex<Vec<ProvisionSpec>>,
    executions: Mutex<Vec<ExecRequest>>,
    listed_paths: Mutex<Vec<String>>,
    shells: AtomicUsize,
    teardowns: AtomicUsize,
}

impl FakeContainerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_setup(error: SetupError) -> Self {
        let fake = Self::new();
        *fake.setup_error.lock().unwrap() = Some(error);
        fake
    }

    /// Queue outcomes for a command.
    pub fn script(self, command: &str, outcomes: impl IntoIterator<Item = Scripted>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .extend(outcomes);
        self
    }

    pub fn with_env(self, key: &str, value: &str) -> Self {
        self.env
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_files(self, entries: &[&str]) -> Self {
        *self.files.lock().unwrap() = entries.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_shell_exit(self, code: i32) -> Self {
        *self.shell_exit.lock().unwrap() = Some(code);
        self
    }

    pub fn provisions(&self) -> Vec<ProvisionSpec> {
        self.provisions.lock().unwrap().clone()
    }

    pub fn executions(&self) -> Vec<ExecRequest> {
        self.executions.lock().unwrap().clone()
    }

    /// Commands executed, in order.
    pub fn executed_commands(&self) -> Vec<String> {
        self.executions().into_iter().map(|r| r.command).collect()
    }

    pub fn listed_paths(&self) -> Vec<String> {
        self.listed_paths.lock().unwrap().clone()
    }

    pub fn shell_count(&self) -> usize {
        self.shells.load(Ordering::SeqCst)
    }

    pub fn teardown_count(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }

    /// Provisioned and not yet torn down.
    pub fn has_container(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn next_outcome(&self, command: &str) -> Scripted {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Scripted::ok(""),
        }
    }
}

impl ContainerRuntime for FakeContainerRuntime {
    fn provision(&self, spec: ProvisionSpec) -> BoxFuture<'_, Result<(), SetupError>> {
        Box::pin(async move {
            self.provisions.lock().unwrap().push(spec);
            if let Some(err) = self.setup_error.lock().unwrap().clone() {
                return Err(err);
            }
            self.ready.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn execute(&self, request: ExecRequest) -> BoxFuture<'_, Result<StepResult, ExecutionError>> {
        Box::pin(async move {
            if !self.has_container() {
                return Err(ExecutionError::NoContainer);
            }
            let outcome = self.next_outcome(&request.command);
            self.executions.lock().unwrap().push(request);

            match outcome {
                Scripted::Exit {
                    code,
                    stdout,
                    stderr,
                    delay,
                } => {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(StepResult::new(code, stdout, stderr))
                }
                Scripted::DispatchError(reason) => Err(ExecutionError::Dispatch(reason)),
            }
        })
    }

    fn list_files(&self, path: String) -> BoxFuture<'_, Vec<String>> {
        Box::pin(async move {
            self.listed_paths.lock().unwrap().push(path);
            self.files.lock().unwrap().clone()
        })
    }

    fn dump_environment(&self) -> BoxFuture<'_, EnvMap> {
        Box::pin(async move { self.env.lock().unwrap().clone() })
    }

    fn shell_in(&self) -> BoxFuture<'_, Result<Option<i32>, ExecutionError>> {
        Box::pin(async move {
            if !self.has_container() {
                return Err(ExecutionError::NoContainer);
            }
            self.shells.fetch_add(1, Ordering::SeqCst);
            Ok(Some(self.shell_exit.lock().unwrap().unwrap_or(0)))
        })
    }

    fn teardown(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.ready.store(false, Ordering::SeqCst);
            self.teardowns.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn container_name(&self) -> &str {
        "pipestep-fake"
    }
}
