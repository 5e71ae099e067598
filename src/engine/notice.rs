// src/engine/notice.rs

//! Notices emitted by the controller for the presentation layer.

use std::time::Duration;

use crate::model::{EnvMap, Job, Step};
use crate::types::{OutputStream, StepStatus};

/// Consumer of controller notices (terminal console, test recorder, ...).
///
/// Frontends only observe; they issue commands by sending
/// [`RuntimeEvent::Operator`](crate::engine::RuntimeEvent::Operator) events.
pub trait Frontend: Send {
    fn present(&mut self, notice: &SessionNotice);
}

/// One row of the step list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub index: usize,
    pub name: String,
    pub status: StepStatus,
    pub breakpoint: bool,
    pub is_action: bool,
    pub exit_code: Option<i32>,
}

impl StepSummary {
    pub fn of(index: usize, step: &Step) -> Self {
        Self {
            index,
            name: step.name.clone(),
            status: step.state.status,
            breakpoint: step.state.breakpoint,
            is_action: step.is_action(),
            exit_code: step.state.exit_code,
        }
    }
}

/// Everything needed to render one step in detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDetail {
    pub summary: StepSummary,
    pub image: String,
    pub command: String,
    pub action: Option<String>,
    /// Environment the step executes with (job env plus step env).
    pub env: EnvMap,
    pub working_directory: String,
    pub output: String,
}

impl StepDetail {
    pub fn of(job: &Job, index: usize, step: &Step) -> Self {
        Self {
            summary: StepSummary::of(index, step),
            image: job.image.clone(),
            command: step.command.clone(),
            action: step.action.clone(),
            env: job.execution_env(step),
            working_directory: step.working_directory.clone(),
            output: step.state.output.clone(),
        }
    }
}

/// Result of a read-only container inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectionReport {
    Environment(EnvMap),
    Files { path: String, entries: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// Provisioning has been requested.
    SessionStarted {
        job: String,
        image: String,
        steps: Vec<StepSummary>,
    },
    ContainerReady,
    SetupFailed { reason: String },
    /// The job consists solely of delegated actions.
    NoRunnableSteps,
    StepStatusChanged {
        index: usize,
        status: StepStatus,
    },
    Output {
        index: usize,
        stream: OutputStream,
        line: String,
    },
    StepFinished {
        index: usize,
        status: StepStatus,
        exit_code: i32,
        elapsed: Duration,
    },
    BreakpointToggled { index: usize, enabled: bool },
    BreakpointHit { index: usize },
    AutoRunStarted { index: usize },
    /// Auto-run stopped because a step failed.
    AutoRunCancelled { index: usize },
    /// Every step reached a terminal status.
    SessionComplete,
    ShellLaunching,
    ShellReturned { exit_code: Option<i32>, error: Option<String> },
    ShellUnavailable,
    /// An inspection needs a container and none is running.
    ContainerUnavailable,
    StepList(Vec<StepSummary>),
    StepDetail(Box<StepDetail>),
    Inspection(InspectionReport),
    QuitRequested,
    /// The controller is at rest and will act on the next command.
    AwaitingOperator { cursor: Option<usize> },
}
