// src/engine/event_handlers.rs

//! Event handling logic for the session core.
//!
//! Each handler validates the event against the current phase and either
//! mutates the session state and returns commands, or does nothing. Invalid
//! operator input is never an error: it is logged at debug level and
//! otherwise ignored.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::container::{ExecRequest, ProvisionSpec};
use crate::engine::notice::{InspectionReport, SessionNotice, StepDetail};
use crate::engine::state::{Advance, SessionEnd, SessionPhase, SessionState};
use crate::errors::{ExecutionError, SetupError};
use crate::model::{StepResult, WORKSPACE_PATH};
use crate::types::{OutputStream, StepStatus};

/// Command produced by the core, to be carried out by the async shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Bring up the session container (via the dispatcher).
    Provision(ProvisionSpec),
    /// Run one step's command (via the dispatcher).
    Execute { index: usize, request: ExecRequest },
    /// Read-only container inspection (via the dispatcher).
    Inspect(InspectRequest),
    /// Hand the terminal to a shell in the container; blocks the loop.
    ShellIn,
    /// Abort in-flight work and destroy the container.
    Teardown,
    /// Tell the frontend something.
    Notify(SessionNotice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectRequest {
    Environment,
    Files { path: String },
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    /// Commands in the order they must be carried out.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn continuing(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub fn stopping(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: false,
        }
    }

    /// The notices among the commands, in order.
    pub fn notices(&self) -> impl Iterator<Item = &SessionNotice> {
        self.commands.iter().filter_map(|c| match c {
            CoreCommand::Notify(n) => Some(n),
            _ => None,
        })
    }
}

fn notify(out: &mut Vec<CoreCommand>, notice: SessionNotice) {
    out.push(CoreCommand::Notify(notice));
}

/// Start the session: refuse jobs with nothing to run, otherwise provision.
pub fn handle_begin(state: &mut SessionState) -> CoreStep {
    let mut out = Vec::new();

    notify(
        &mut out,
        SessionNotice::SessionStarted {
            job: state.job.name.clone(),
            image: state.job.image.clone(),
            steps: state.summaries(),
        },
    );

    if !state.job.has_runnable_steps() {
        warn!(job = %state.job.name, "job has no runnable steps");
        state.end = Some(SessionEnd::NoRunnableSteps);
        notify(&mut out, SessionNotice::NoRunnableSteps);
        return CoreStep::stopping(out);
    }

    info!(job = %state.job.name, image = %state.job.image, "provisioning container");
    out.push(CoreCommand::Provision(ProvisionSpec {
        job_name: state.job.name.clone(),
        image: state.job.image.clone(),
        env: state.job.env.clone(),
        host_dir: state.host_dir.clone(),
    }));
    CoreStep::continuing(out)
}

pub fn handle_setup_finished(
    state: &mut SessionState,
    result: Result<(), SetupError>,
) -> CoreStep {
    let mut out = Vec::new();

    if state.phase != SessionPhase::AwaitingSetup {
        warn!(phase = ?state.phase, "ignoring setup completion outside of setup");
        return CoreStep::continuing(out);
    }

    if let Err(err) = result {
        warn!(error = %err, "container setup failed");
        state.end = Some(SessionEnd::SetupFailed(err.to_string()));
        notify(
            &mut out,
            SessionNotice::SetupFailed {
                reason: err.to_string(),
            },
        );
        out.push(CoreCommand::Teardown);
        return CoreStep::stopping(out);
    }

    state.container_ready = true;
    notify(&mut out, SessionNotice::ContainerReady);

    if let Advance::Landed(index) = state.advance_from(0, &mut out) {
        announce_pause(index, &mut out);
    }
    CoreStep::continuing(out)
}

/// Start the step under the cursor if the current phase allows it.
///
/// Returns `false` (and changes nothing) when the run is not valid.
pub fn start_step(state: &mut SessionState, out: &mut Vec<CoreCommand>) -> bool {
    let SessionPhase::Paused(index) = state.phase else {
        debug!(phase = ?state.phase, "run ignored: not paused at a step");
        return false;
    };

    let job = &state.job;
    let step = &job.steps[index];
    if step.is_action() || !step.state.status.is_runnable() {
        debug!(step = index, status = %step.state.status, "run ignored: step not runnable");
        return false;
    }

    let request = ExecRequest {
        command: step.command.clone(),
        env: job.execution_env(step),
        working_directory: step.working_directory.clone(),
    };

    info!(step = index, name = %step.name, "running step");
    state.job.steps[index].state.status = StepStatus::Running;
    state.phase = SessionPhase::Running(index);
    notify(
        out,
        SessionNotice::StepStatusChanged {
            index,
            status: StepStatus::Running,
        },
    );
    out.push(CoreCommand::Execute { index, request });
    true
}

pub fn handle_run_step(state: &mut SessionState) -> CoreStep {
    let mut out = Vec::new();
    start_step(state, &mut out);
    CoreStep::continuing(out)
}

pub fn handle_run_to_breakpoint(state: &mut SessionState) -> CoreStep {
    let mut out = Vec::new();
    let Some(index) = state.cursor() else {
        return CoreStep::continuing(out);
    };

    state.auto_run = true;
    let mut started = Vec::new();
    if start_step(state, &mut started) {
        info!(step = index, "auto-running to next breakpoint");
        notify(&mut out, SessionNotice::AutoRunStarted { index });
        out.append(&mut started);
    } else {
        state.auto_run = false;
    }
    CoreStep::continuing(out)
}

pub fn handle_step_finished(
    state: &mut SessionState,
    index: usize,
    result: StepResult,
    elapsed: Duration,
) -> CoreStep {
    let mut out = Vec::new();

    if state.phase != SessionPhase::Running(index) {
        warn!(step = index, phase = ?state.phase, "ignoring stale step result");
        return CoreStep::continuing(out);
    }

    push_output(index, &result, &mut out);

    let status = state.job.steps[index].state.record_result(&result);
    info!(
        step = index,
        exit_code = result.exit_code,
        elapsed_ms = elapsed.as_millis() as u64,
        %status,
        "step finished"
    );
    notify(
        &mut out,
        SessionNotice::StepFinished {
            index,
            status,
            exit_code: result.exit_code,
            elapsed,
        },
    );

    if status == StepStatus::Failed {
        // Cursor stays here; the failed step is retryable.
        state.phase = SessionPhase::Paused(index);
        if state.auto_run {
            state.auto_run = false;
            notify(&mut out, SessionNotice::AutoRunCancelled { index });
        }
        return CoreStep::continuing(out);
    }

    if let Advance::Landed(next) = state.advance_from(index + 1, &mut out) {
        if !state.auto_run {
            announce_pause(next, &mut out);
        } else if state.job.steps[next].state.breakpoint {
            info!(step = next, "breakpoint hit");
            state.auto_run = false;
            announce_pause(next, &mut out);
            notify(&mut out, SessionNotice::BreakpointHit { index: next });
        } else {
            start_step(state, &mut out);
        }
    }
    CoreStep::continuing(out)
}

/// Skip the step under the cursor without running it.
///
/// Skipping never checks breakpoints: the cursor lands on the next step
/// and rests there regardless of its flag.
pub fn handle_skip_step(state: &mut SessionState) -> CoreStep {
    let mut out = Vec::new();
    let SessionPhase::Paused(index) = state.phase else {
        debug!(phase = ?state.phase, "skip ignored: not paused at a step");
        return CoreStep::continuing(out);
    };

    let step = &mut state.job.steps[index];
    if !step.state.status.is_runnable() {
        debug!(step = index, status = %step.state.status, "skip ignored");
        return CoreStep::continuing(out);
    }

    info!(step = index, name = %step.name, "skipping step");
    step.state.status = StepStatus::Skipped;
    state.auto_run = false;
    notify(
        &mut out,
        SessionNotice::StepStatusChanged {
            index,
            status: StepStatus::Skipped,
        },
    );

    if let Advance::Landed(next) = state.advance_from(index + 1, &mut out) {
        announce_pause(next, &mut out);
    }
    CoreStep::continuing(out)
}

pub fn handle_toggle_breakpoint(state: &mut SessionState, index: Option<usize>) -> CoreStep {
    let mut out = Vec::new();
    let Some(index) = index.or_else(|| state.cursor()) else {
        debug!("breakpoint ignored: no step given and no cursor");
        return CoreStep::continuing(out);
    };

    match state.job.steps.get_mut(index) {
        Some(step) if !step.is_action() => {
            let enabled = step.state.toggle_breakpoint();
            info!(step = index, enabled, "breakpoint toggled");
            notify(&mut out, SessionNotice::BreakpointToggled { index, enabled });
        }
        Some(_) => debug!(step = index, "breakpoint ignored: action step"),
        None => debug!(step = index, "breakpoint ignored: no such step"),
    }
    CoreStep::continuing(out)
}

pub fn handle_shell_in(state: &mut SessionState) -> CoreStep {
    let mut out = Vec::new();
    if state.container_ready {
        notify(&mut out, SessionNotice::ShellLaunching);
        out.push(CoreCommand::ShellIn);
    } else {
        notify(&mut out, SessionNotice::ShellUnavailable);
    }
    CoreStep::continuing(out)
}

pub fn handle_shell_exited(result: Result<Option<i32>, ExecutionError>) -> CoreStep {
    let notice = match result {
        Ok(exit_code) => SessionNotice::ShellReturned {
            exit_code,
            error: None,
        },
        Err(err) => {
            warn!(error = %err, "interactive shell could not start");
            SessionNotice::ShellReturned {
                exit_code: None,
                error: Some(err.to_string()),
            }
        }
    };
    CoreStep::continuing(vec![CoreCommand::Notify(notice)])
}

pub fn handle_show_steps(state: &SessionState) -> CoreStep {
    CoreStep::continuing(vec![CoreCommand::Notify(SessionNotice::StepList(
        state.summaries(),
    ))])
}

pub fn handle_show_step(state: &SessionState, index: Option<usize>) -> CoreStep {
    let index = index.or_else(|| state.cursor()).unwrap_or(0);
    let Some(step) = state.job.steps.get(index) else {
        debug!(step = index, "detail ignored: no such step");
        return CoreStep::continuing(Vec::new());
    };
    let detail = StepDetail::of(&state.job, index, step);
    CoreStep::continuing(vec![CoreCommand::Notify(SessionNotice::StepDetail(
        Box::new(detail),
    ))])
}

pub fn handle_inspect(state: &SessionState, request: InspectRequest) -> CoreStep {
    if !state.container_ready {
        return CoreStep::continuing(vec![CoreCommand::Notify(
            SessionNotice::ContainerUnavailable,
        )]);
    }
    CoreStep::continuing(vec![CoreCommand::Inspect(request)])
}

pub fn handle_inspection_finished(report: InspectionReport) -> CoreStep {
    CoreStep::continuing(vec![CoreCommand::Notify(SessionNotice::Inspection(report))])
}

/// Quit (operator) or shutdown (signal): tear down and end the session.
pub fn handle_quit(state: &mut SessionState, end: SessionEnd) -> CoreStep {
    info!(reason = ?end, "ending session");
    state.end = Some(end);
    state.auto_run = false;
    let out = vec![
        CoreCommand::Notify(SessionNotice::QuitRequested),
        CoreCommand::Teardown,
    ];
    CoreStep::stopping(out)
}

/// Default path for file listings.
pub fn default_listing_path(path: Option<String>) -> String {
    path.unwrap_or_else(|| WORKSPACE_PATH.to_string())
}

fn announce_pause(index: usize, out: &mut Vec<CoreCommand>) {
    notify(
        out,
        SessionNotice::StepStatusChanged {
            index,
            status: StepStatus::Paused,
        },
    );
}

fn push_output(index: usize, result: &StepResult, out: &mut Vec<CoreCommand>) {
    for (stream, text) in [
        (OutputStream::Stdout, &result.stdout),
        (OutputStream::Stderr, &result.stderr),
    ] {
        for line in text.lines() {
            notify(
                out,
                SessionNotice::Output {
                    index,
                    stream,
                    line: line.to_string(),
                },
            );
        }
    }
}
