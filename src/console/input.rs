// src/console/input.rs

//! Operator input: one command per line on stdin.

use std::io::{BufRead, Write};
use std::sync::mpsc as std_mpsc;
use std::thread;

use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::RuntimeEvent;
use crate::types::OperatorCommand;

use super::render::PROMPT;

pub const HELP_TEXT: &str = "\
Commands (N is a step number as listed):
  r, run          run the step at the cursor (retry if it failed)
  s, skip         skip the step at the cursor
  b, break [N]    toggle a breakpoint (default: cursor step)
  n, next         run until the next breakpoint
  i, shell        open an interactive shell in the container
  l, list         list steps
  d, detail [N]   show one step in detail
  e, env          show the container environment
  f, files [PATH] list files (default: /workspace)
  q, quit         tear down the container and exit
  h, help         show this help";

/// Read commands from `input` until quit, end of input, or the controller
/// goes away.
///
/// After a shell request the reader blocks on `resume` so the shell has the
/// terminal to itself. End of input is treated as `quit`.
pub fn read_commands<B: BufRead, W: Write>(
    mut input: B,
    mut out: W,
    events: &mpsc::Sender<RuntimeEvent>,
    resume: &std_mpsc::Receiver<()>,
) {
    let mut line = String::new();
    loop {
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                debug!("operator input closed; quitting");
                let _ = events.blocking_send(RuntimeEvent::Operator(OperatorCommand::Quit));
                return;
            }
            Ok(_) => {}
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            let _ = write!(out, "{PROMPT}");
            let _ = out.flush();
            continue;
        }
        if matches!(trimmed, "h" | "help" | "?") {
            let _ = writeln!(out, "{HELP_TEXT}");
            let _ = write!(out, "{PROMPT}");
            let _ = out.flush();
            continue;
        }

        let command = match trimmed.parse::<OperatorCommand>() {
            Ok(command) => command,
            Err(err) => {
                let _ = writeln!(out, "{err} (type h for help)");
                let _ = write!(out, "{PROMPT}");
                let _ = out.flush();
                continue;
            }
        };

        let stop = command == OperatorCommand::Quit;
        let shell = command == OperatorCommand::ShellIn;
        if events.blocking_send(RuntimeEvent::Operator(command)).is_err() {
            debug!("controller gone; input reader exiting");
            return;
        }
        if stop {
            return;
        }
        if shell && resume.recv().is_err() {
            return;
        }
    }
}

/// Spawn the stdin reader on its own OS thread (stdin reads block).
pub fn spawn_input_reader(
    events: mpsc::Sender<RuntimeEvent>,
    resume: std_mpsc::Receiver<()>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        read_commands(stdin.lock(), std::io::stdout(), &events, &resume);
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn drain(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Vec<OperatorCommand> {
        let mut commands = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let RuntimeEvent::Operator(command) = event {
                commands.push(command);
            }
        }
        commands
    }

    #[test]
    fn forwards_commands_until_quit() {
        let (tx, mut rx) = mpsc::channel(16);
        let (_resume_tx, resume_rx) = std_mpsc::channel();
        let input = Cursor::new("b 2\n\nbogus\nr\nq\nr\n");
        let mut out = Vec::new();

        read_commands(input, &mut out, &tx, &resume_rx);

        assert_eq!(
            drain(&mut rx),
            vec![
                OperatorCommand::ToggleBreakpoint { index: Some(1) },
                OperatorCommand::RunStep,
                OperatorCommand::Quit,
            ]
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("type h for help"));
    }

    #[test]
    fn end_of_input_quits() {
        let (tx, mut rx) = mpsc::channel(4);
        let (_resume_tx, resume_rx) = std_mpsc::channel();
        read_commands(Cursor::new("l\n"), Vec::new(), &tx, &resume_rx);
        assert_eq!(
            drain(&mut rx),
            vec![OperatorCommand::ShowSteps, OperatorCommand::Quit]
        );
    }

    #[test]
    fn shell_waits_for_resume() {
        let (tx, mut rx) = mpsc::channel(4);
        let (resume_tx, resume_rx) = std_mpsc::channel();
        // Resume signal dropped: the reader stops after the shell request.
        drop(resume_tx);
        read_commands(Cursor::new("i\nr\n"), Vec::new(), &tx, &resume_rx);
        assert_eq!(drain(&mut rx), vec![OperatorCommand::ShellIn]);
    }

    #[test]
    fn help_is_local() {
        let (tx, mut rx) = mpsc::channel(4);
        let (_resume_tx, resume_rx) = std_mpsc::channel();
        let mut out = Vec::new();
        read_commands(Cursor::new("h\nq\n"), &mut out, &tx, &resume_rx);
        assert_eq!(drain(&mut rx), vec![OperatorCommand::Quit]);
        assert!(String::from_utf8(out).unwrap().contains("run until the next breakpoint"));
    }
}
