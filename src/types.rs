// src/types.rs

use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a single step within a debugging session.
///
/// `Pending → Paused → Running → {Completed | Failed}`; `Skipped` is terminal
/// and reached without execution. A `Failed` step may be run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Paused => "paused",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        }
    }

    /// `true` once the step will not be attempted again in this session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped)
    }

    /// Statuses from which an operator `run` is accepted.
    pub fn is_runnable(&self) -> bool {
        matches!(
            self,
            StepStatus::Paused | StepStatus::Pending | StepStatus::Failed
        )
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(StepStatus::Pending),
            "running" => Ok(StepStatus::Running),
            "paused" => Ok(StepStatus::Paused),
            "completed" => Ok(StepStatus::Completed),
            "failed" => Ok(StepStatus::Failed),
            "skipped" => Ok(StepStatus::Skipped),
            other => Err(format!("invalid step status: {other}")),
        }
    }
}

/// Which stream a captured output line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A discrete action the operator can issue against the controller.
///
/// Step indices are zero-based here; the textual form accepted by
/// [`FromStr`] is one-based, matching what the console displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    RunStep,
    SkipStep,
    /// `None` targets the step under the cursor.
    ToggleBreakpoint { index: Option<usize> },
    RunToBreakpoint,
    ShellIn,
    Quit,
    ShowSteps,
    ShowStep { index: Option<usize> },
    ShowEnvironment,
    ListFiles { path: Option<String> },
}

impl FromStr for OperatorCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| "empty command".to_string())?
            .to_lowercase();
        let arg = words.next();

        if words.next().is_some() {
            return Err(format!("too many arguments for '{verb}'"));
        }

        let cmd = match verb.as_str() {
            "r" | "run" => OperatorCommand::RunStep,
            "s" | "skip" => OperatorCommand::SkipStep,
            "b" | "break" | "breakpoint" => OperatorCommand::ToggleBreakpoint {
                index: arg.map(parse_step_number).transpose()?,
            },
            "n" | "next" => OperatorCommand::RunToBreakpoint,
            "i" | "shell" => OperatorCommand::ShellIn,
            "q" | "quit" | "exit" => OperatorCommand::Quit,
            "l" | "list" => OperatorCommand::ShowSteps,
            "d" | "detail" => OperatorCommand::ShowStep {
                index: arg.map(parse_step_number).transpose()?,
            },
            "e" | "env" => OperatorCommand::ShowEnvironment,
            "f" | "files" => OperatorCommand::ListFiles {
                path: arg.map(str::to_string),
            },
            other => return Err(format!("unknown command: {other}")),
        };

        let takes_arg = matches!(
            cmd,
            OperatorCommand::ToggleBreakpoint { .. }
                | OperatorCommand::ShowStep { .. }
                | OperatorCommand::ListFiles { .. }
        );
        if arg.is_some() && !takes_arg {
            return Err(format!("'{verb}' takes no arguments"));
        }

        Ok(cmd)
    }
}

/// Parse a one-based step number into a zero-based index.
fn parse_step_number(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("invalid step number: {s} (expected 1 or greater)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_display() {
        for status in [
            StepStatus::Pending,
            StepStatus::Running,
            StepStatus::Paused,
            StepStatus::Completed,
            StepStatus::Failed,
            StepStatus::Skipped,
        ] {
            assert_eq!(status.to_string().parse::<StepStatus>(), Ok(status));
        }
    }

    #[test]
    fn failed_is_runnable_but_not_terminal() {
        assert!(StepStatus::Failed.is_runnable());
        assert!(!StepStatus::Failed.is_terminal());
        assert!(!StepStatus::Running.is_runnable());
        assert!(StepStatus::Skipped.is_terminal());
    }

    #[test]
    fn parses_short_and_long_verbs() {
        assert_eq!("r".parse(), Ok(OperatorCommand::RunStep));
        assert_eq!("skip".parse(), Ok(OperatorCommand::SkipStep));
        assert_eq!("N".parse(), Ok(OperatorCommand::RunToBreakpoint));
        assert_eq!(" shell ".parse(), Ok(OperatorCommand::ShellIn));
        assert_eq!("exit".parse(), Ok(OperatorCommand::Quit));
    }

    #[test]
    fn step_numbers_are_one_based() {
        assert_eq!(
            "b 3".parse(),
            Ok(OperatorCommand::ToggleBreakpoint { index: Some(2) })
        );
        assert_eq!(
            "b".parse(),
            Ok(OperatorCommand::ToggleBreakpoint { index: None })
        );
        assert!("b 0".parse::<OperatorCommand>().is_err());
        assert!("d x".parse::<OperatorCommand>().is_err());
    }

    #[test]
    fn files_takes_a_path() {
        assert_eq!(
            "f /tmp".parse(),
            Ok(OperatorCommand::ListFiles {
                path: Some("/tmp".to_string())
            })
        );
    }

    #[test]
    fn rejects_unknown_or_extra_arguments() {
        assert!("jump".parse::<OperatorCommand>().is_err());
        assert!("run now".parse::<OperatorCommand>().is_err());
        assert!("b 1 2".parse::<OperatorCommand>().is_err());
        assert!("".parse::<OperatorCommand>().is_err());
    }
}
