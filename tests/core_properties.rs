// tests/core_properties.rs

use std::path::PathBuf;
use std::time::Duration;

use proptest::prelude::*;
use pipestep::engine::{CoreCommand, RuntimeEvent, SessionCore, SessionPhase};
use pipestep::model::{Job, Step, StepResult};
use pipestep::types::{OperatorCommand, StepStatus};

/// Something the operator or the container does next.
#[derive(Debug, Clone)]
enum Action {
    Run,
    Skip,
    Next,
    Toggle(usize),
    /// Finish the running step (if any) with this exit code.
    Finish(i32),
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => Just(Action::Run),
        1 => Just(Action::Skip),
        1 => Just(Action::Next),
        1 => (0usize..8).prop_map(Action::Toggle),
        4 => prop_oneof![Just(0), Just(0), Just(1), Just(127)].prop_map(Action::Finish),
    ]
}

// `true` marks an action step.
fn job_strategy() -> impl Strategy<Value = Vec<bool>> {
    proptest::collection::vec(any::<bool>(), 1..8)
}

fn build_job(kinds: &[bool]) -> Job {
    let mut job = Job::new("prop", "ubuntu-latest", "ubuntu:22.04");
    for (i, is_action) in kinds.iter().enumerate() {
        let step = if *is_action {
            Step::action(format!("action {i}"), "actions/checkout@v4")
        } else {
            Step::run(format!("step {i}"), format!("echo {i}"))
        };
        job.steps.push(step);
    }
    job
}

fn to_event(action: &Action, core: &SessionCore) -> Option<RuntimeEvent> {
    let command = match action {
        Action::Run => OperatorCommand::RunStep,
        Action::Skip => OperatorCommand::SkipStep,
        Action::Next => OperatorCommand::RunToBreakpoint,
        Action::Toggle(i) => OperatorCommand::ToggleBreakpoint { index: Some(*i) },
        Action::Finish(code) => {
            let SessionPhase::Running(index) = core.phase() else {
                return None;
            };
            return Some(RuntimeEvent::StepFinished {
                index,
                result: StepResult::new(*code, "", ""),
                elapsed: Duration::from_millis(1),
            });
        }
    };
    Some(RuntimeEvent::Operator(command))
}

/// Everything before the cursor is settled, everything after is untouched.
fn check_layout(core: &SessionCore) -> Result<(), TestCaseError> {
    let steps = &core.job().steps;
    let running = steps
        .iter()
        .filter(|s| s.state.status == StepStatus::Running)
        .count();
    prop_assert!(running <= 1);

    let (cursor, cursor_ok): (usize, &[StepStatus]) = match core.phase() {
        SessionPhase::AwaitingSetup => return Ok(()),
        SessionPhase::Paused(i) => (i, &[StepStatus::Paused, StepStatus::Failed][..]),
        SessionPhase::Running(i) => (i, &[StepStatus::Running][..]),
        SessionPhase::Complete => (steps.len(), &[][..]),
    };
    prop_assert_eq!(running, usize::from(matches!(core.phase(), SessionPhase::Running(_))));

    for (i, step) in steps.iter().enumerate() {
        let status = step.state.status;
        if i < cursor {
            prop_assert!(status.is_terminal(), "step {} is {:?} behind the cursor", i, status);
        } else if i == cursor {
            prop_assert!(!step.is_action());
            prop_assert!(cursor_ok.contains(&status), "cursor step is {:?}", status);
        } else {
            prop_assert_eq!(status, StepStatus::Pending);
        }
        if step.is_action() {
            prop_assert!(!step.state.breakpoint);
        }
    }
    if core.phase() == SessionPhase::Complete {
        prop_assert!(!core.auto_run());
    }
    Ok(())
}

proptest! {
    #[test]
    fn cursor_layout_holds_for_any_operator(
        kinds in job_strategy(),
        actions in proptest::collection::vec(action_strategy(), 0..40),
    ) {
        let job = build_job(&kinds);
        let mut core = SessionCore::new(job, PathBuf::from("."));
        let begin = core.begin();

        if kinds.iter().all(|is_action| *is_action) {
            prop_assert!(!begin.keep_running);
            return Ok(());
        }

        core.step(RuntimeEvent::SetupFinished(Ok(())));
        check_layout(&core)?;

        for action in &actions {
            let Some(event) = to_event(action, &core) else { continue };
            let step = core.step(event);
            prop_assert!(step.keep_running);

            for command in &step.commands {
                if let CoreCommand::Execute { index, .. } = command {
                    prop_assert!(!core.job().steps[*index].is_action());
                    prop_assert_eq!(core.phase(), SessionPhase::Running(*index));
                }
            }
            check_layout(&core)?;
        }
    }

    #[test]
    fn breakpoints_only_change_on_toggle(
        kinds in job_strategy(),
        actions in proptest::collection::vec(action_strategy(), 0..40),
    ) {
        prop_assume!(kinds.iter().any(|is_action| !*is_action));
        let mut core = SessionCore::new(build_job(&kinds), PathBuf::from("."));
        core.begin();
        core.step(RuntimeEvent::SetupFinished(Ok(())));

        for action in &actions {
            let before: Vec<bool> = core.job().steps.iter().map(|s| s.state.breakpoint).collect();
            let Some(event) = to_event(action, &core) else { continue };
            core.step(event);
            let after: Vec<bool> = core.job().steps.iter().map(|s| s.state.breakpoint).collect();

            match action {
                Action::Toggle(i) => {
                    for (j, (b, a)) in before.iter().zip(&after).enumerate() {
                        if j != *i {
                            prop_assert_eq!(b, a);
                        }
                    }
                }
                _ => {
                    prop_assert_eq!(before, after);
                }
            }
        }
    }
}
