#![allow(dead_code)]

use pipestep::model::{Job, Step};

/// Builder for `Job` to simplify test setup.
pub struct JobBuilder {
    job: Job,
}

impl JobBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            job: Job::new(name, "ubuntu-latest", "ubuntu:22.04"),
        }
    }

    pub fn image(mut self, image: &str) -> Self {
        self.job.image = image.to_string();
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.job.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn run(self, name: &str, command: &str) -> Self {
        self.step(StepBuilder::run(name, command).build())
    }

    pub fn action(self, name: &str, reference: &str) -> Self {
        self.step(Step::action(name, reference))
    }

    pub fn step(mut self, step: Step) -> Self {
        self.job.steps.push(step);
        self
    }

    pub fn build(self) -> Job {
        self.job
    }
}

/// Builder for `Step`.
pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    pub fn run(name: &str, command: &str) -> Self {
        Self {
            step: Step::run(name, command),
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.step = self.step.with_env(key, value);
        self
    }

    pub fn working_directory(mut self, dir: &str) -> Self {
        self.step = self.step.with_working_directory(dir);
        self
    }

    pub fn breakpoint(mut self) -> Self {
        self.step.state.breakpoint = true;
        self
    }

    pub fn build(self) -> Step {
        self.step
    }
}
