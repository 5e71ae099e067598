// src/engine/core.rs

//! Pure session state machine.
//!
//! [`SessionCore`] consumes [`RuntimeEvent`]s and produces:
//! - an updated session state (cursor, step statuses, breakpoints, auto-run)
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Session`) is responsible for:
//! - reading events from the channel
//! - handing provision/execute/inspect work to the dispatcher
//! - running the interactive shell and tearing the container down
//! - forwarding notices to the frontend
//!
//! Nothing in here touches Tokio, channels, processes or the terminal, so
//! every transition is unit tested directly.

use std::path::PathBuf;

use tracing::debug;

use crate::engine::RuntimeEvent;
use crate::engine::event_handlers::{
    CoreCommand, CoreStep, InspectRequest, default_listing_path, handle_begin,
    handle_inspect, handle_inspection_finished, handle_quit, handle_run_step,
    handle_run_to_breakpoint, handle_setup_finished, handle_shell_exited, handle_shell_in,
    handle_show_step, handle_show_steps, handle_skip_step, handle_step_finished,
    handle_toggle_breakpoint,
};
use crate::engine::notice::SessionNotice;
use crate::engine::state::{SessionEnd, SessionPhase, SessionState, SessionSummary};
use crate::model::Job;
use crate::types::OperatorCommand;

/// Pure controller for one debugging session over one job.
#[derive(Debug)]
pub struct SessionCore {
    state: SessionState,
}

impl SessionCore {
    pub fn new(job: Job, host_dir: PathBuf) -> Self {
        Self {
            state: SessionState::new(job, host_dir),
        }
    }

    pub fn job(&self) -> &Job {
        &self.state.job
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn cursor(&self) -> Option<usize> {
        self.state.cursor()
    }

    pub fn auto_run(&self) -> bool {
        self.state.auto_run
    }

    pub fn end(&self) -> Option<&SessionEnd> {
        self.state.end.as_ref()
    }

    /// Final (or current) outcome of the session.
    ///
    /// A session that never recorded an end reason was interrupted.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            end: self.state.end.clone().unwrap_or(SessionEnd::Interrupted),
            steps: self.state.summaries(),
        }
    }

    /// Kick off the session. Must be called once, before any event.
    pub fn begin(&mut self) -> CoreStep {
        let step = handle_begin(&mut self.state);
        self.finish(step)
    }

    /// Handle a single event, returning the commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        if self.state.end.is_some() {
            debug!(?event, "session already ended; ignoring event");
            return CoreStep::stopping(Vec::new());
        }

        let step = match event {
            RuntimeEvent::Operator(command) => self.operator(command),
            RuntimeEvent::SetupFinished(result) => handle_setup_finished(&mut self.state, result),
            RuntimeEvent::StepFinished {
                index,
                result,
                elapsed,
            } => handle_step_finished(&mut self.state, index, result, elapsed),
            RuntimeEvent::InspectionFinished(report) => handle_inspection_finished(report),
            RuntimeEvent::ShellExited(result) => handle_shell_exited(result),
            RuntimeEvent::ShutdownRequested => {
                handle_quit(&mut self.state, SessionEnd::Interrupted)
            }
        };
        self.finish(step)
    }

    fn operator(&mut self, command: OperatorCommand) -> CoreStep {
        debug!(?command, phase = ?self.state.phase, "operator command");
        match command {
            OperatorCommand::RunStep => handle_run_step(&mut self.state),
            OperatorCommand::SkipStep => handle_skip_step(&mut self.state),
            OperatorCommand::ToggleBreakpoint { index } => {
                handle_toggle_breakpoint(&mut self.state, index)
            }
            OperatorCommand::RunToBreakpoint => handle_run_to_breakpoint(&mut self.state),
            OperatorCommand::ShellIn => handle_shell_in(&mut self.state),
            OperatorCommand::Quit => handle_quit(&mut self.state, SessionEnd::Quit),
            OperatorCommand::ShowSteps => handle_show_steps(&self.state),
            OperatorCommand::ShowStep { index } => handle_show_step(&self.state, index),
            OperatorCommand::ShowEnvironment => {
                handle_inspect(&self.state, InspectRequest::Environment)
            }
            OperatorCommand::ListFiles { path } => handle_inspect(
                &self.state,
                InspectRequest::Files {
                    path: default_listing_path(path),
                },
            ),
        }
    }

    /// Append the "ready for input" notice when the controller rests and
    /// nothing that answers later (shell, inspection) is outstanding.
    fn finish(&self, mut step: CoreStep) -> CoreStep {
        let pending = step
            .commands
            .iter()
            .any(|c| matches!(c, CoreCommand::ShellIn | CoreCommand::Inspect(_)));

        if step.keep_running && !pending && self.state.is_resting() {
            step.commands
                .push(CoreCommand::Notify(SessionNotice::AwaitingOperator {
                    cursor: self.state.cursor(),
                }));
        }
        step
    }
}
