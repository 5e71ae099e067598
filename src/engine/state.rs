// src/engine/state.rs

//! Session state and cursor movement.

use std::path::PathBuf;

use tracing::debug;

use crate::engine::event_handlers::CoreCommand;
use crate::engine::notice::{SessionNotice, StepSummary};
use crate::model::Job;
use crate::types::StepStatus;

/// Logical controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Container provisioning has not finished; there is no cursor.
    AwaitingSetup,
    /// Resting at the cursor. The step there is `Paused` or `Failed`.
    Paused(usize),
    /// The step at the cursor is executing.
    Running(usize),
    /// The cursor moved past the last step.
    Complete,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    SetupFailed(String),
    NoRunnableSteps,
    /// Ctrl-C or the event source closed.
    Interrupted,
}

/// What the session left behind, for the caller of `Session::run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub end: SessionEnd,
    pub steps: Vec<StepSummary>,
}

/// Where a cursor advance stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Landed(usize),
    Exhausted,
}

/// Mutable controller state for one session.
#[derive(Debug)]
pub struct SessionState {
    pub job: Job,
    /// Host directory mounted into the container.
    pub host_dir: PathBuf,
    pub phase: SessionPhase,
    pub auto_run: bool,
    pub container_ready: bool,
    pub end: Option<SessionEnd>,
}

impl SessionState {
    pub fn new(job: Job, host_dir: PathBuf) -> Self {
        Self {
            job,
            host_dir,
            phase: SessionPhase::AwaitingSetup,
            auto_run: false,
            container_ready: false,
            end: None,
        }
    }

    /// Index of the step eligible for run/skip/retry, if any.
    pub fn cursor(&self) -> Option<usize> {
        match self.phase {
            SessionPhase::Paused(i) | SessionPhase::Running(i) => Some(i),
            SessionPhase::AwaitingSetup | SessionPhase::Complete => None,
        }
    }

    /// At rest: nothing running and a command would be acted upon.
    pub fn is_resting(&self) -> bool {
        self.end.is_none() && matches!(self.phase, SessionPhase::Paused(_) | SessionPhase::Complete)
    }

    pub fn summaries(&self) -> Vec<StepSummary> {
        self.job
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| StepSummary::of(i, step))
            .collect()
    }

    /// Move the cursor forward starting at `from`.
    ///
    /// Action steps passed over are marked `Skipped`. The first non-action
    /// step becomes `Paused` (without a notice; callers announce it, since
    /// an auto-run may start it straight away). Running off the end
    /// completes the session and cancels auto-run.
    pub fn advance_from(&mut self, from: usize, out: &mut Vec<CoreCommand>) -> Advance {
        let mut index = from;
        while let Some(step) = self.job.steps.get_mut(index) {
            if step.is_action() {
                step.state.status = StepStatus::Skipped;
                debug!(step = index, name = %step.name, "skipping action step");
                out.push(CoreCommand::Notify(SessionNotice::StepStatusChanged {
                    index,
                    status: StepStatus::Skipped,
                }));
                index += 1;
                continue;
            }

            step.state.status = StepStatus::Paused;
            self.phase = SessionPhase::Paused(index);
            debug!(step = index, name = %step.name, "cursor landed");
            return Advance::Landed(index);
        }

        debug!("cursor passed the last step; session complete");
        self.phase = SessionPhase::Complete;
        self.auto_run = false;
        out.push(CoreCommand::Notify(SessionNotice::SessionComplete));
        Advance::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Step;

    fn state_with(steps: Vec<Step>) -> SessionState {
        let mut job = Job::new("build", "ubuntu-latest", "ubuntu:22.04");
        job.steps = steps;
        SessionState::new(job, PathBuf::from("."))
    }

    #[test]
    fn advance_skips_actions_and_lands() {
        let mut state = state_with(vec![
            Step::action("Checkout", "actions/checkout@v4"),
            Step::action("Setup", "actions/setup-node@v4"),
            Step::run("Build", "make"),
        ]);
        let mut out = Vec::new();

        assert_eq!(state.advance_from(0, &mut out), Advance::Landed(2));
        assert_eq!(state.phase, SessionPhase::Paused(2));
        assert_eq!(state.job.steps[0].state.status, StepStatus::Skipped);
        assert_eq!(state.job.steps[1].state.status, StepStatus::Skipped);
        assert_eq!(state.job.steps[2].state.status, StepStatus::Paused);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn advance_past_end_completes() {
        let mut state = state_with(vec![Step::run("Build", "make")]);
        state.auto_run = true;
        let mut out = Vec::new();

        assert_eq!(state.advance_from(1, &mut out), Advance::Exhausted);
        assert_eq!(state.phase, SessionPhase::Complete);
        assert!(!state.auto_run);
        assert_eq!(state.cursor(), None);
        assert!(state.is_resting());
    }

    #[test]
    fn awaiting_setup_has_no_cursor() {
        let state = state_with(vec![Step::run("Build", "make")]);
        assert_eq!(state.cursor(), None);
        assert!(!state.is_resting());
    }
}
