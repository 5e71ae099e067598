use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pipestep::engine::{Frontend, RuntimeEvent, SessionNotice};
use pipestep::types::OperatorCommand;
use tokio::sync::mpsc;

/// Shared log of everything a frontend was told.
pub type NoticeLog = Arc<Mutex<Vec<SessionNotice>>>;

/// A frontend that plays an operator:
/// - records every notice
/// - sends the next scripted command each time the controller waits for
///   input, and `Quit` once the script runs out.
pub struct ScriptedFrontend {
    events: mpsc::Sender<RuntimeEvent>,
    script: VecDeque<OperatorCommand>,
    log: NoticeLog,
}

impl ScriptedFrontend {
    pub fn new(
        events: mpsc::Sender<RuntimeEvent>,
        script: impl IntoIterator<Item = OperatorCommand>,
    ) -> Self {
        Self {
            events,
            script: script.into_iter().collect(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the recorded notices, usable after the session consumed
    /// the frontend.
    pub fn log(&self) -> NoticeLog {
        Arc::clone(&self.log)
    }
}

impl Frontend for ScriptedFrontend {
    fn present(&mut self, notice: &SessionNotice) {
        self.log.lock().unwrap().push(notice.clone());

        if let SessionNotice::AwaitingOperator { .. } = notice {
            let command = self.script.pop_front().unwrap_or(OperatorCommand::Quit);
            let _ = self.events.try_send(RuntimeEvent::Operator(command));
        }
    }
}

/// Notices in the log matching `pred`.
pub fn notices_matching(
    log: &NoticeLog,
    pred: impl Fn(&SessionNotice) -> bool,
) -> Vec<SessionNotice> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|n| pred(n))
        .cloned()
        .collect()
}
