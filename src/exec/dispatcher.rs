// src/exec/dispatcher.rs

//! Runs container work off the control loop.
//!
//! Every long-running adapter call (provision, step execution, inspection)
//! is spawned onto a `JoinSet` owned by the dispatcher and reports back to
//! the controller as a [`RuntimeEvent`]. The controller's loop therefore
//! never blocks on the container runtime and keeps receiving operator
//! commands while a step runs.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::container::{ContainerRuntime, ExecRequest, ProvisionSpec};
use crate::engine::{InspectRequest, InspectionReport, RuntimeEvent};
use crate::model::StepResult;

pub struct Dispatcher<R: ContainerRuntime> {
    runtime: Arc<R>,
    events: mpsc::Sender<RuntimeEvent>,
    tasks: JoinSet<()>,
}

impl<R: ContainerRuntime> std::fmt::Debug for Dispatcher<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("container", &self.runtime.container_name())
            .field("in_flight", &self.tasks.len())
            .finish()
    }
}

impl<R: ContainerRuntime> Dispatcher<R> {
    pub fn new(runtime: Arc<R>, events: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime,
            events,
            tasks: JoinSet::new(),
        }
    }

    pub fn provision(&mut self, spec: ProvisionSpec) {
        self.reap();
        let runtime = Arc::clone(&self.runtime);
        let events = self.events.clone();

        self.tasks.spawn(async move {
            let result = runtime.provision(spec).await;
            send(&events, RuntimeEvent::SetupFinished(result)).await;
        });
    }

    /// Execute one step. Dispatch failures are folded into a failed
    /// [`StepResult`] so the controller sees a single completion shape.
    pub fn execute(&mut self, index: usize, request: ExecRequest) {
        self.reap();
        let runtime = Arc::clone(&self.runtime);
        let events = self.events.clone();

        self.tasks.spawn(async move {
            let started = Instant::now();
            let result = match runtime.execute(request).await {
                Ok(result) => result,
                Err(err) => {
                    warn!(step = index, error = %err, "step could not be dispatched");
                    StepResult::from(err)
                }
            };
            let elapsed = started.elapsed();
            debug!(step = index, exit_code = result.exit_code, ?elapsed, "execution returned");
            send(
                &events,
                RuntimeEvent::StepFinished {
                    index,
                    result,
                    elapsed,
                },
            )
            .await;
        });
    }

    pub fn inspect(&mut self, request: InspectRequest) {
        self.reap();
        let runtime = Arc::clone(&self.runtime);
        let events = self.events.clone();

        self.tasks.spawn(async move {
            let report = match request {
                InspectRequest::Environment => {
                    InspectionReport::Environment(runtime.dump_environment().await)
                }
                InspectRequest::Files { path } => {
                    let entries = runtime.list_files(path.clone()).await;
                    InspectionReport::Files { path, entries }
                }
            };
            send(&events, RuntimeEvent::InspectionFinished(report)).await;
        });
    }

    /// Abort everything in flight and wait for the tasks to unwind.
    ///
    /// Aborting drops the adapter futures, which kills their child
    /// processes (`kill_on_drop`).
    pub async fn shutdown(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        info!(in_flight = self.tasks.len(), "aborting in-flight container work");
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
    }

    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(err) = joined {
                if err.is_panic() {
                    warn!(error = %err, "dispatcher task panicked");
                }
            }
        }
    }
}

async fn send(events: &mpsc::Sender<RuntimeEvent>, event: RuntimeEvent) {
    if events.send(event).await.is_err() {
        debug!("controller gone; dropping dispatcher event");
    }
}
