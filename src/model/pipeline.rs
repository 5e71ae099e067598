// src/model/pipeline.rs

use crate::model::{EnvMap, StepState, WORKSPACE_PATH};

/// A parsed pipeline definition.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub name: String,
    /// Human readable trigger description, e.g. `"on: push, pull_request"`.
    pub trigger: String,
    pub jobs: Vec<Job>,
}

impl Workflow {
    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

/// One job of a workflow; the unit a debugging session is bound to.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    /// Platform label as written in the workflow (`runs-on`).
    pub runs_on: String,
    /// Container image resolved from `runs_on`.
    pub image: String,
    pub steps: Vec<Step>,
    /// Workflow env merged with job env (job wins).
    pub env: EnvMap,
}

impl Job {
    pub fn new(name: impl Into<String>, runs_on: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs_on: runs_on.into(),
            image: image.into(),
            steps: Vec::new(),
            env: EnvMap::new(),
        }
    }

    /// Environment a step executes with: job env, then the step's own env on top.
    pub fn execution_env(&self, step: &Step) -> EnvMap {
        let mut env = self.env.clone();
        env.extend(step.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }

    /// Number of steps that can actually execute locally.
    pub fn runnable_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_action()).count()
    }

    pub fn has_runnable_steps(&self) -> bool {
        self.runnable_count() > 0
    }
}

/// A single step of a job.
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    /// Shell command text; empty for action steps.
    pub command: String,
    pub env: EnvMap,
    pub working_directory: String,
    /// Reference of a delegated action (`uses:`). Such steps are never executed.
    pub action: Option<String>,
    pub state: StepState,
}

impl Step {
    /// A shell-command step running in the workspace root.
    pub fn run(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            env: EnvMap::new(),
            working_directory: WORKSPACE_PATH.to_string(),
            action: None,
            state: StepState::default(),
        }
    }

    /// A delegated action step.
    pub fn action(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            action: Some(reference.into()),
            ..Self::run(name, "")
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = dir.into();
        self
    }

    pub fn is_action(&self) -> bool {
        self.action.is_some()
    }
}
