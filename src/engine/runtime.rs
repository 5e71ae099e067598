// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::container::ContainerRuntime;
use crate::exec::Dispatcher;

use super::core::SessionCore;
use super::notice::Frontend;
use super::state::SessionSummary;
use super::{CoreCommand, RuntimeEvent};

/// Drives a [`SessionCore`] in response to `RuntimeEvent`s and carries out
/// the commands it returns.
///
/// This is a pure IO shell: all debugging semantics live in the core. The
/// session owns the event receiver; the matching sender is shared with the
/// dispatcher (completions), the operator input source, and the signal
/// handler.
pub struct Session<R: ContainerRuntime, F: Frontend> {
    core: SessionCore,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    dispatcher: Dispatcher<R>,
    runtime: Arc<R>,
    frontend: F,
}

impl<R: ContainerRuntime, F: Frontend> fmt::Debug for Session<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("core", &self.core)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl<R: ContainerRuntime, F: Frontend> Session<R, F> {
    /// Build a session. `event_tx` must be the sender half of `event_rx`.
    pub fn new(
        core: SessionCore,
        runtime: Arc<R>,
        frontend: F,
        event_tx: mpsc::Sender<RuntimeEvent>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
    ) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&runtime), event_tx);
        Self {
            core,
            event_rx,
            dispatcher,
            runtime,
            frontend,
        }
    }

    /// Main event loop.
    ///
    /// - Starts the session (provisioning).
    /// - Consumes `RuntimeEvent`s and feeds them into the core.
    /// - Carries out the returned commands in order.
    ///
    /// However the loop ends, outstanding work is aborted and the container
    /// is torn down before returning.
    pub async fn run(mut self) -> SessionSummary {
        info!(job = %self.core.job().name, "debug session started");

        let mut keep_running = self.apply_step_result(None).await;

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("session event channel closed; exiting");
                    self.apply(RuntimeEvent::ShutdownRequested).await;
                    break;
                }
            };

            debug!(?event, "session received event");
            keep_running = self.apply(event).await;
        }

        // Teardown is idempotent, so a quit that already tore down is fine.
        self.dispatcher.shutdown().await;
        self.runtime.teardown().await;

        let summary = self.core.summary();
        info!(end = ?summary.end, "debug session finished");
        summary
    }

    /// Hand an event to the core and carry out the result.
    async fn apply(&mut self, event: RuntimeEvent) -> bool {
        self.apply_step_result(Some(event)).await
    }

    /// `None` starts the session.
    async fn apply_step_result(&mut self, event: Option<RuntimeEvent>) -> bool {
        let step = match event {
            Some(event) => self.core.step(event),
            None => self.core.begin(),
        };
        let mut keep_running = step.keep_running;
        let mut queue: VecDeque<CoreCommand> = step.commands.into();

        while let Some(command) = queue.pop_front() {
            match command {
                CoreCommand::Provision(spec) => self.dispatcher.provision(spec),
                CoreCommand::Execute { index, request } => self.dispatcher.execute(index, request),
                CoreCommand::Inspect(request) => self.dispatcher.inspect(request),
                CoreCommand::Notify(notice) => self.frontend.present(&notice),
                CoreCommand::Teardown => {
                    self.dispatcher.shutdown().await;
                    self.runtime.teardown().await;
                }
                CoreCommand::ShellIn => {
                    // The shell owns the terminal; nothing else is processed
                    // until it returns.
                    info!(container = %self.runtime.container_name(), "handing terminal to shell");
                    let result = self.runtime.shell_in().await;
                    let follow_up = self.core.step(RuntimeEvent::ShellExited(result));
                    keep_running = keep_running && follow_up.keep_running;
                    queue.extend(follow_up.commands);
                }
            }
        }

        keep_running
    }
}
