// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod container;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod model;
pub mod parser;
pub mod types;

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;

use anyhow::{Context, Result, bail};
use dialoguer::Select;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command, RunArgs};
use crate::config::load_or_default;
use crate::console::{ConsoleFrontend, spawn_input_reader};
use crate::container::DockerRuntime;
use crate::engine::{RuntimeEvent, Session, SessionCore, SessionEnd};
use crate::errors::PipestepError;
use crate::model::{Job, Workflow};
use crate::parser::{ImageMap, parse_file};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Run(run) => run_workflow(run).await,
    }
}

/// This wires together:
/// - settings and workflow loading
/// - job selection
/// - container adapter, session core and session shell
/// - console input/output
/// - Ctrl-C handling
async fn run_workflow(args: RunArgs) -> Result<()> {
    let settings = load_or_default(args.config.as_deref()).context("loading settings")?;

    if !args.workflow.is_file() {
        bail!("workflow file not found: {}", args.workflow.display());
    }

    let images = ImageMap::with_overrides(&settings.images);
    let parsed = parse_file(&args.workflow, &images)
        .with_context(|| format!("parsing {}", args.workflow.display()))?;
    let workflow = parsed.workflow;

    println!("Workflow: {}", workflow.name);
    println!("Trigger: {}", workflow.trigger);
    println!("Jobs: {}", workflow.jobs.len());
    for warning in &parsed.warnings {
        warn!("{warning}");
        println!("Warning: {warning}");
    }

    let job = select_job(&workflow, args.job.as_deref(), prompt_for_job)?;

    println!();
    println!("Job: {}", job.name);
    println!("Image: {}", job.image);
    println!(
        "Steps: {} total, {} runnable",
        job.steps.len(),
        job.runnable_count()
    );

    if args.dry_run {
        print_dry_run(&job);
        return Ok(());
    }

    let workdir = absolute_workdir(&args.workdir)?;
    info!(job = %job.name, workdir = %workdir.display(), "starting debug session");

    // Session event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Operator console: notices out on stdout, commands in from stdin.
    let (resume_tx, resume_rx) = std_mpsc::channel();
    let frontend = ConsoleFrontend::new(std::io::stdout(), Some(resume_tx));
    let _input_handle = spawn_input_reader(rt_tx.clone(), resume_rx);

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let runtime = Arc::new(DockerRuntime::new(&settings.runtime, &job.name));
    let core = SessionCore::new(job, workdir);
    let session = Session::new(core, runtime, frontend, rt_tx, rt_rx);
    let summary = session.run().await;

    match summary.end {
        SessionEnd::SetupFailed(reason) => bail!("container setup failed: {reason}"),
        SessionEnd::NoRunnableSteps => bail!("job has no runnable steps"),
        SessionEnd::Quit | SessionEnd::Interrupted => Ok(()),
    }
}

/// Pick the job to debug.
///
/// - An explicit name must exist.
/// - A single job is chosen without asking.
/// - Otherwise `prompt` is given `name (N steps)` labels and returns an index.
pub fn select_job<P>(workflow: &Workflow, requested: Option<&str>, prompt: P) -> Result<Job>
where
    P: FnOnce(&[String]) -> Result<usize>,
{
    if let Some(name) = requested {
        return workflow
            .job(name)
            .cloned()
            .ok_or_else(|| PipestepError::JobNotFound(name.to_string()).into());
    }

    if let [only] = workflow.jobs.as_slice() {
        return Ok(only.clone());
    }

    let labels: Vec<String> = workflow
        .jobs
        .iter()
        .map(|job| format!("{} ({} steps)", job.name, job.steps.len()))
        .collect();
    let index = prompt(&labels)?;
    workflow
        .jobs
        .get(index)
        .cloned()
        .with_context(|| format!("no job at index {index}"))
}

fn prompt_for_job(labels: &[String]) -> Result<usize> {
    let index = Select::new()
        .with_prompt("Select a job to debug")
        .items(labels)
        .default(0)
        .interact()?;
    Ok(index)
}

/// Simple dry-run output: print the job's steps without executing anything.
fn print_dry_run(job: &Job) {
    println!();
    println!("pipestep dry-run");
    for (i, step) in job.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step.name);
        match &step.action {
            Some(action) => println!("      uses: {action} (skipped locally)"),
            None => {
                for line in step.command.lines() {
                    println!("      run: {line}");
                }
                println!("      working-directory: {}", step.working_directory);
            }
        }
        if !step.env.is_empty() {
            println!("      env: {:?}", step.env);
        }
    }
}

/// Host directory to mount, made absolute (docker rejects relative bind
/// sources).
pub fn absolute_workdir(dir: &Path) -> Result<std::path::PathBuf> {
    std::path::absolute(dir).with_context(|| format!("resolving {}", dir.display()))
}
