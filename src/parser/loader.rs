// src/parser/loader.rs

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::errors::{PipestepError, Result};
use crate::model::{EnvMap, Job, Step, WORKSPACE_PATH, Workflow};
use crate::parser::images::ImageMap;
use crate::parser::raw::{RawJob, RawStep, RawWorkflow};

const DEFAULT_RUNS_ON: &str = "ubuntu-latest";

/// A workflow plus the non-fatal problems found while normalising it.
#[derive(Debug, Clone)]
pub struct ParsedWorkflow {
    pub workflow: Workflow,
    pub warnings: Vec<String>,
}

/// Parse a workflow file from disk.
pub fn parse_file(path: impl AsRef<Path>, images: &ImageMap) -> Result<ParsedWorkflow> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = contents.len(), "parsing workflow file");
    parse_str(&contents, images)
}

/// Parse a workflow document.
///
/// Fails on malformed structure rather than returning a partial model.
pub fn parse_str(contents: &str, images: &ImageMap) -> Result<ParsedWorkflow> {
    let doc: Value = serde_yaml::from_str(contents)?;
    if !doc.is_mapping() {
        return Err(PipestepError::WorkflowError(format!(
            "expected YAML mapping, got {}",
            kind_of(&doc)
        )));
    }

    let raw: RawWorkflow = serde_yaml::from_value(doc)?;

    let jobs_raw = match raw.jobs {
        Some(Value::Mapping(jobs)) if !jobs.is_empty() => jobs,
        Some(Value::Mapping(_)) => {
            return Err(PipestepError::WorkflowError(
                "the 'jobs' section defines no jobs".to_string(),
            ));
        }
        _ => {
            return Err(PipestepError::WorkflowError(
                "no 'jobs' section found".to_string(),
            ));
        }
    };

    let workflow_env = env_map(raw.env.as_ref());
    let mut warnings = Vec::new();
    let mut jobs = Vec::with_capacity(jobs_raw.len());

    for (id, body) in jobs_raw {
        let job_id = scalar_to_string(&id);
        let raw_job: RawJob = serde_yaml::from_value(body).map_err(|e| {
            PipestepError::WorkflowError(format!("job '{job_id}' is malformed: {e}"))
        })?;
        jobs.push(build_job(job_id, raw_job, &workflow_env, images, &mut warnings));
    }

    let workflow = Workflow {
        name: raw
            .name
            .unwrap_or_else(|| "Unnamed Workflow".to_string()),
        trigger: describe_trigger(raw.on.as_ref()),
        jobs,
    };

    Ok(ParsedWorkflow { workflow, warnings })
}

fn build_job(
    name: String,
    raw: RawJob,
    workflow_env: &EnvMap,
    images: &ImageMap,
    warnings: &mut Vec<String>,
) -> Job {
    let runs_on = runs_on_label(raw.runs_on.as_ref());
    let image = match images.resolve(&runs_on) {
        Ok(image) => image.to_string(),
        Err(fallback) => {
            warnings.push(format!(
                "'{runs_on}' has no local Docker mapping. Using {fallback} as fallback."
            ));
            fallback.to_string()
        }
    };

    let mut env = workflow_env.clone();
    env.extend(env_map(raw.env.as_ref()));

    let steps = raw
        .steps
        .into_iter()
        .filter_map(|step| build_step(step, &env))
        .collect();

    Job {
        name,
        runs_on,
        image,
        steps,
        env,
    }
}

/// `None` for steps that neither `run` nor `uses` anything.
fn build_step(raw: RawStep, job_env: &EnvMap) -> Option<Step> {
    let mut env = job_env.clone();
    env.extend(env_map(raw.env.as_ref()));

    if let Some(reference) = raw.uses {
        let name = raw
            .name
            .unwrap_or_else(|| format!("Action: {reference}"));
        let mut step = Step::action(name, reference);
        step.env = env;
        return Some(step);
    }

    let command = raw.run?.trim().to_string();
    let name = raw
        .name
        .unwrap_or_else(|| command.lines().next().unwrap_or_default().to_string());

    let mut step = Step::run(name, command).with_working_directory(resolve_working_directory(
        raw.working_directory.as_deref(),
    ));
    step.env = env;
    Some(step)
}

fn resolve_working_directory(dir: Option<&str>) -> String {
    match dir {
        Some(dir) if dir.starts_with('/') => dir.to_string(),
        Some(dir) if !dir.is_empty() => format!("{WORKSPACE_PATH}/{dir}"),
        _ => WORKSPACE_PATH.to_string(),
    }
}

fn runs_on_label(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => DEFAULT_RUNS_ON.to_string(),
        Some(Value::Sequence(labels)) => labels
            .first()
            .map(scalar_to_string)
            .unwrap_or_else(|| DEFAULT_RUNS_ON.to_string()),
        Some(other) => scalar_to_string(other),
    }
}

fn describe_trigger(on: Option<&Value>) -> String {
    let events = match on {
        Some(Value::String(event)) => event.clone(),
        Some(Value::Sequence(events)) => events
            .iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Mapping(events)) => events
            .keys()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        _ => "unknown".to_string(),
    };
    format!("on: {events}")
}

fn env_map(mapping: Option<&Mapping>) -> EnvMap {
    mapping
        .into_iter()
        .flatten()
        .map(|(k, v)| (scalar_to_string(k), scalar_to_string(v)))
        .collect()
}

/// Stringify a YAML value the way a shell environment would see it.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(doc: &str) -> ParsedWorkflow {
        parse_str(doc, &ImageMap::default()).unwrap()
    }

    #[test]
    fn trigger_forms() {
        assert_eq!(describe_trigger(None), "on: unknown");
        let wf = parse("on: push\njobs:\n  a:\n    steps: []\n");
        assert_eq!(wf.workflow.trigger, "on: push");
        let wf = parse("on: [push, pull_request]\njobs:\n  a:\n    steps: []\n");
        assert_eq!(wf.workflow.trigger, "on: push, pull_request");
        let wf = parse("on:\n  push:\n    branches: [main]\n  workflow_dispatch:\njobs:\n  a:\n    steps: []\n");
        assert_eq!(wf.workflow.trigger, "on: push, workflow_dispatch");
    }

    #[test]
    fn env_values_are_stringified() {
        let wf = parse(
            "env:\n  FLAG: true\n  COUNT: 3\n  EMPTY:\njobs:\n  a:\n    steps:\n      - run: env\n",
        );
        let env = &wf.workflow.jobs[0].env;
        assert_eq!(env["FLAG"], "true");
        assert_eq!(env["COUNT"], "3");
        assert_eq!(env["EMPTY"], "");
    }

    #[test]
    fn step_env_wins_over_job_and_workflow() {
        let wf = parse(
            "env:\n  LEVEL: workflow\n  ONLY_WORKFLOW: w\njobs:\n  a:\n    env:\n      LEVEL: job\n    steps:\n      - run: env\n        env:\n          LEVEL: step\n",
        );
        let job = &wf.workflow.jobs[0];
        assert_eq!(job.env["LEVEL"], "job");
        assert_eq!(job.env["ONLY_WORKFLOW"], "w");

        let env = job.execution_env(&job.steps[0]);
        assert_eq!(env["LEVEL"], "step");
        assert_eq!(env["ONLY_WORKFLOW"], "w");
    }

    #[test]
    fn runs_on_list_uses_first_label() {
        let wf = parse("jobs:\n  a:\n    runs-on: [ubuntu-24.04, x64]\n    steps: []\n");
        assert_eq!(wf.workflow.jobs[0].runs_on, "ubuntu-24.04");
        assert_eq!(wf.workflow.jobs[0].image, "ubuntu:24.04");
        assert!(wf.warnings.is_empty());
    }

    #[test]
    fn missing_runs_on_defaults_to_ubuntu_latest() {
        let wf = parse("jobs:\n  a:\n    steps: []\n");
        assert_eq!(wf.workflow.jobs[0].runs_on, "ubuntu-latest");
        assert_eq!(wf.workflow.jobs[0].image, "ubuntu:22.04");
    }

    #[test]
    fn unknown_runs_on_warns_and_falls_back() {
        let wf = parse("jobs:\n  mac:\n    runs-on: macos-14\n    steps: []\n");
        assert_eq!(wf.workflow.jobs[0].image, "ubuntu:22.04");
        assert_eq!(wf.warnings.len(), 1);
        assert!(wf.warnings[0].contains("'macos-14' has no local Docker mapping"));
    }

    #[test]
    fn steps_without_run_or_uses_are_dropped() {
        let wf = parse("jobs:\n  a:\n    steps:\n      - name: nothing\n      - run: echo hi\n");
        assert_eq!(wf.workflow.jobs[0].steps.len(), 1);
    }

    #[test]
    fn absolute_working_directory_is_kept() {
        assert_eq!(resolve_working_directory(Some("/tmp/x")), "/tmp/x");
        assert_eq!(resolve_working_directory(Some("src")), "/workspace/src");
        assert_eq!(resolve_working_directory(None), "/workspace");
    }

    #[test]
    fn rejects_non_mapping_documents() {
        let err = parse_str("- a\n- b\n", &ImageMap::default()).unwrap_err();
        assert!(matches!(err, PipestepError::WorkflowError(msg) if msg.contains("sequence")));
    }

    #[test]
    fn rejects_missing_or_empty_jobs() {
        let err = parse_str("name: x\n", &ImageMap::default()).unwrap_err();
        assert!(matches!(err, PipestepError::WorkflowError(msg) if msg.contains("no 'jobs'")));
        let err = parse_str("jobs: {}\n", &ImageMap::default()).unwrap_err();
        assert!(matches!(err, PipestepError::WorkflowError(_)));
    }

    #[test]
    fn job_order_is_declaration_order() {
        let wf = parse("jobs:\n  zeta:\n    steps: []\n  alpha:\n    steps: []\n");
        let names: Vec<_> = wf.workflow.jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha"]);
    }
}
