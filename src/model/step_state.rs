// src/model/step_state.rs

//! Mutable per-step state and the result of one execution attempt.

use crate::errors::ExecutionError;
use crate::types::StepStatus;

/// Exit code reported for a step whose command could not be dispatched.
pub const DISPATCH_FAILURE_EXIT_CODE: i32 = 1;

/// Per-step state; only the controller mutates it, and only during a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepState {
    pub status: StepStatus,
    pub breakpoint: bool,
    /// Absent until the step has executed at least once.
    pub exit_code: Option<i32>,
    /// Combined stdout followed by stderr of the latest execution.
    pub output: String,
}

impl StepState {
    /// Merge an execution result and return the resulting status.
    pub fn record_result(&mut self, result: &StepResult) -> StepStatus {
        self.exit_code = Some(result.exit_code);
        self.output = result.combined_output();
        self.status = if result.succeeded() {
            StepStatus::Completed
        } else {
            StepStatus::Failed
        };
        self.status
    }

    /// Flip the breakpoint flag and return its new value.
    pub fn toggle_breakpoint(&mut self) -> bool {
        self.breakpoint = !self.breakpoint;
        self.breakpoint
    }
}

/// Outcome of running one step's command. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl StepResult {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    pub fn combined_output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

impl From<ExecutionError> for StepResult {
    /// A dispatch failure surfaces as an ordinary failed result so the
    /// controller handles it on the same path as a non-zero exit.
    fn from(err: ExecutionError) -> Self {
        StepResult::new(DISPATCH_FAILURE_EXIT_CODE, "", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_exit_completes() {
        let mut state = StepState::default();
        let status = state.record_result(&StepResult::new(0, "ok\n", ""));
        assert_eq!(status, StepStatus::Completed);
        assert_eq!(state.exit_code, Some(0));
        assert_eq!(state.output, "ok\n");
    }

    #[test]
    fn non_zero_exit_fails_and_keeps_both_streams() {
        let mut state = StepState::default();
        let status = state.record_result(&StepResult::new(2, "out\n", "err\n"));
        assert_eq!(status, StepStatus::Failed);
        assert_eq!(state.exit_code, Some(2));
        assert_eq!(state.output, "out\nerr\n");
    }

    #[test]
    fn toggling_twice_restores_flag() {
        let mut state = StepState::default();
        assert!(state.toggle_breakpoint());
        assert!(!state.toggle_breakpoint());
        assert!(!state.breakpoint);
    }

    #[test]
    fn execution_error_becomes_failed_result() {
        let result = StepResult::from(ExecutionError::NoContainer);
        assert!(!result.succeeded());
        assert_eq!(result.exit_code, DISPATCH_FAILURE_EXIT_CODE);
        assert!(result.stderr.contains("no container"));
        assert!(result.stdout.is_empty());
    }
}
