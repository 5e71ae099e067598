// src/console/render.rs

//! Plain-text rendering of controller notices.

use std::io::Write;
use std::sync::mpsc as std_mpsc;

use tracing::debug;

use crate::engine::{Frontend, InspectionReport, SessionNotice, StepDetail, StepSummary};
use crate::types::{OutputStream, StepStatus};

pub const PROMPT: &str = "pipestep> ";

/// One-character status marker used in step lists.
pub fn status_icon(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => " ",
        StepStatus::Running => "~",
        StepStatus::Paused => "●",
        StepStatus::Completed => "✓",
        StepStatus::Failed => "✗",
        StepStatus::Skipped => "⊘",
    }
}

/// `✓ 2. Build [B]`, numbered from 1 the way the operator types indices.
pub fn step_line(step: &StepSummary) -> String {
    let mut line = format!("{} {}. {}", status_icon(step.status), step.index + 1, step.name);
    if step.is_action {
        line.push_str(" (action, skipped)");
    }
    if step.breakpoint {
        line.push_str(" [B]");
    }
    if let Some(code) = step.exit_code {
        if step.status == StepStatus::Failed {
            line.push_str(&format!(" (exit {code})"));
        }
    }
    line
}

/// Terminal console: prints notices to `out` and shows a prompt whenever
/// the controller waits for input.
pub struct ConsoleFrontend<W: Write + Send> {
    out: W,
    names: Vec<String>,
    /// Wakes the input reader once an interactive shell gave the terminal
    /// back (or could not start).
    resume: Option<std_mpsc::Sender<()>>,
}

impl<W: Write + Send> ConsoleFrontend<W> {
    pub fn new(out: W, resume: Option<std_mpsc::Sender<()>>) -> Self {
        Self {
            out,
            names: Vec::new(),
            resume,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn name(&self, index: usize) -> String {
        self.names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("step {}", index + 1))
    }

    /// Lines to print for a notice. The prompt is handled separately.
    pub fn render(&mut self, notice: &SessionNotice) -> Vec<String> {
        match notice {
            SessionNotice::SessionStarted { job, image, steps } => {
                self.names = steps.iter().map(|s| s.name.clone()).collect();
                vec![
                    format!("Job: {job} ({image})"),
                    "Setting up container...".to_string(),
                ]
            }
            SessionNotice::ContainerReady => vec!["Container ready.".to_string()],
            SessionNotice::SetupFailed { reason } => {
                vec![format!("Setup failed: {reason}")]
            }
            SessionNotice::NoRunnableSteps => {
                vec!["No runnable steps: every step is an action.".to_string()]
            }
            SessionNotice::StepStatusChanged { index, status } => match status {
                StepStatus::Running => vec![String::new(), format!("> Running: {}", self.name(*index))],
                StepStatus::Paused => vec![
                    String::new(),
                    format!("● Paused at: {}", self.name(*index)),
                ],
                StepStatus::Skipped => vec![format!("  ⊘ Skipped: {}", self.name(*index))],
                _ => Vec::new(),
            },
            SessionNotice::Output { stream, line, .. } => match stream {
                OutputStream::Stdout => vec![format!("  {line}")],
                OutputStream::Stderr => vec![format!("  ! {line}")],
            },
            SessionNotice::StepFinished {
                status,
                exit_code,
                elapsed,
                ..
            } => {
                let secs = elapsed.as_secs_f64();
                if *status == StepStatus::Completed {
                    vec![format!("  ✓ Step passed (exit code 0, {secs:.1}s)")]
                } else {
                    vec![
                        format!("  ✗ Step failed (exit code {exit_code}, {secs:.1}s)"),
                        "  [r]etry  [i] shell  [s]kip  [q]uit".to_string(),
                    ]
                }
            }
            SessionNotice::BreakpointToggled { index, enabled } => {
                let tag = if *enabled { "set" } else { "removed" };
                vec![format!("  Breakpoint {tag}: {}", self.name(*index))]
            }
            SessionNotice::BreakpointHit { index } => {
                vec![format!("● Breakpoint hit: {}", self.name(*index))]
            }
            SessionNotice::AutoRunStarted { .. } => {
                vec!["Auto-running to next breakpoint...".to_string()]
            }
            SessionNotice::AutoRunCancelled { index } => vec![format!(
                "Auto-run stopped: {} failed",
                self.name(*index)
            )],
            SessionNotice::SessionComplete => vec![
                String::new(),
                "━━━ All steps complete! ━━━".to_string(),
                "Type q to quit.".to_string(),
            ],
            SessionNotice::ShellLaunching => {
                vec!["Launching interactive shell... (type 'exit' to return)".to_string()]
            }
            SessionNotice::ShellReturned { exit_code, error } => match error {
                Some(err) => vec![format!("Shell could not start: {err}")],
                None => match exit_code {
                    Some(code) if *code != 0 => vec![format!("Returned from shell (exit {code}).")],
                    _ => vec!["Returned from shell.".to_string()],
                },
            },
            SessionNotice::ShellUnavailable => {
                vec!["No container is running; shell unavailable.".to_string()]
            }
            SessionNotice::ContainerUnavailable => {
                vec!["No container is running.".to_string()]
            }
            SessionNotice::StepList(steps) => steps.iter().map(step_line).collect(),
            SessionNotice::StepDetail(detail) => detail_lines(detail),
            SessionNotice::Inspection(report) => inspection_lines(report),
            SessionNotice::QuitRequested => vec!["Cleaning up container...".to_string()],
            SessionNotice::AwaitingOperator { .. } => Vec::new(),
        }
    }
}

impl<W: Write + Send> Frontend for ConsoleFrontend<W> {
    fn present(&mut self, notice: &SessionNotice) {
        let lines = self.render(notice);
        let mut write = || -> std::io::Result<()> {
            for line in &lines {
                writeln!(self.out, "{line}")?;
            }
            if matches!(notice, SessionNotice::AwaitingOperator { .. }) {
                write!(self.out, "{PROMPT}")?;
            }
            self.out.flush()
        };
        if let Err(err) = write() {
            debug!(error = %err, "console write failed");
        }

        if matches!(
            notice,
            SessionNotice::ShellReturned { .. } | SessionNotice::ShellUnavailable
        ) {
            if let Some(resume) = &self.resume {
                let _ = resume.send(());
            }
        }
    }
}

fn detail_lines(detail: &StepDetail) -> Vec<String> {
    let mut lines = vec![
        format!("Step {}: {}", detail.summary.index + 1, detail.summary.name),
        format!("  Status: {}", detail.summary.status),
        format!("  Image: {}", detail.image),
    ];
    match &detail.action {
        Some(action) => lines.push(format!("  Action: {action} (not executed locally)")),
        None => {
            lines.push("  Command:".to_string());
            lines.extend(detail.command.lines().map(|l| format!("    {l}")));
        }
    }
    lines.push(format!("  Working directory: {}", detail.working_directory));
    lines.push(format!("  Breakpoint: {}", if detail.summary.breakpoint { "yes" } else { "no" }));
    if let Some(code) = detail.summary.exit_code {
        lines.push(format!("  Exit code: {code}"));
    }
    if !detail.env.is_empty() {
        lines.push("  Env:".to_string());
        lines.extend(detail.env.iter().map(|(k, v)| format!("    {k}={v}")));
    }
    if !detail.output.is_empty() {
        lines.push("  Output:".to_string());
        lines.extend(detail.output.lines().map(|l| format!("    {l}")));
    }
    lines
}

fn inspection_lines(report: &InspectionReport) -> Vec<String> {
    match report {
        InspectionReport::Environment(env) if env.is_empty() => {
            vec!["(environment unavailable)".to_string()]
        }
        InspectionReport::Environment(env) => {
            env.iter().map(|(k, v)| format!("{k}={v}")).collect()
        }
        InspectionReport::Files { path, entries } if entries.is_empty() => {
            vec![format!("{path}: (empty or unreadable)")]
        }
        InspectionReport::Files { path, entries } => {
            let mut lines = vec![format!("{path}:")];
            lines.extend(entries.iter().map(|e| format!("  {e}")));
            lines
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn summary(index: usize, name: &str, status: StepStatus) -> StepSummary {
        StepSummary {
            index,
            name: name.to_string(),
            status,
            breakpoint: false,
            is_action: false,
            exit_code: None,
        }
    }

    #[test]
    fn step_line_marks_breakpoints_and_failures() {
        let mut step = summary(1, "Test", StepStatus::Failed);
        step.breakpoint = true;
        step.exit_code = Some(2);
        assert_eq!(step_line(&step), "✗ 2. Test [B] (exit 2)");

        let mut action = summary(0, "Action: actions/checkout@v4", StepStatus::Skipped);
        action.is_action = true;
        assert_eq!(
            step_line(&action),
            "⊘ 1. Action: actions/checkout@v4 (action, skipped)"
        );
    }

    #[test]
    fn prompt_follows_awaiting_operator() {
        let mut console = ConsoleFrontend::new(Vec::new(), None);
        console.present(&SessionNotice::SessionStarted {
            job: "build".into(),
            image: "ubuntu:22.04".into(),
            steps: vec![summary(0, "Hello", StepStatus::Pending)],
        });
        console.present(&SessionNotice::StepStatusChanged {
            index: 0,
            status: StepStatus::Paused,
        });
        console.present(&SessionNotice::AwaitingOperator { cursor: Some(0) });

        let text = String::from_utf8(console.into_inner()).unwrap();
        assert!(text.contains("Job: build (ubuntu:22.04)"));
        assert!(text.contains("● Paused at: Hello"));
        assert!(text.ends_with(PROMPT));
    }

    #[test]
    fn failure_shows_exit_code_and_choices() {
        let mut console = ConsoleFrontend::new(Vec::new(), None);
        let lines = console.render(&SessionNotice::StepFinished {
            index: 0,
            status: StepStatus::Failed,
            exit_code: 3,
            elapsed: Duration::from_millis(1500),
        });
        assert_eq!(lines[0], "  ✗ Step failed (exit code 3, 1.5s)");
        assert!(lines[1].contains("[r]etry"));
    }

    #[test]
    fn shell_return_wakes_input_reader() {
        let (tx, rx) = std_mpsc::channel();
        let mut console = ConsoleFrontend::new(Vec::new(), Some(tx));
        console.present(&SessionNotice::ShellReturned {
            exit_code: Some(0),
            error: None,
        });
        assert!(rx.try_recv().is_ok());
    }
}
