// src/engine/mod.rs

//! Debug execution controller.
//!
//! The controller is split the same way as any event-driven runtime here:
//! - [`core`] is a synchronous, deterministic state machine that consumes
//!   [`RuntimeEvent`]s and returns [`CoreCommand`]s. It owns the job, the
//!   cursor, breakpoints and the auto-run flag, and performs no IO.
//! - [`runtime`] is the async shell: it reads events from a channel, feeds
//!   them to the core, and carries out the returned commands through the
//!   dispatcher, the container adapter, and the frontend.
//! - [`event_handlers`] holds the per-event transition logic.
//! - [`state`] holds the session state and cursor movement.
//! - [`notice`] defines what the presentation layer is told.

use std::time::Duration;

use crate::errors::{ExecutionError, SetupError};
use crate::model::StepResult;
use crate::types::OperatorCommand;

pub mod core;
pub mod event_handlers;
pub mod notice;
pub mod runtime;
pub mod state;

pub use core::SessionCore;
pub use event_handlers::{CoreCommand, CoreStep, InspectRequest};
pub use notice::{Frontend, InspectionReport, SessionNotice, StepDetail, StepSummary};
pub use runtime::Session;
pub use state::{SessionEnd, SessionPhase, SessionState, SessionSummary};

/// Events flowing into the controller from the operator, the dispatcher,
/// and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// The operator issued a command.
    Operator(OperatorCommand),
    /// Container provisioning finished.
    SetupFinished(Result<(), SetupError>),
    /// A step's command finished (or could not be dispatched).
    StepFinished {
        index: usize,
        result: StepResult,
        elapsed: Duration,
    },
    /// A read-only container inspection finished.
    InspectionFinished(InspectionReport),
    /// The interactive shell handed the terminal back.
    ShellExited(Result<Option<i32>, ExecutionError>),
    /// Ctrl-C, or the event source went away.
    ShutdownRequested,
}
