// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `pipestep`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipestep",
    version,
    about = "Step through CI pipelines locally, one step at a time.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPESTEP_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Debug a workflow job interactively inside a local container.
    Run(RunArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Workflow file (GitHub Actions YAML).
    #[arg(value_name = "WORKFLOW")]
    pub workflow: PathBuf,

    /// Directory mounted into the container at /workspace.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub workdir: PathBuf,

    /// Job to debug. Prompts when omitted and the workflow has several.
    #[arg(long, value_name = "NAME")]
    pub job: Option<String>,

    /// Settings file (TOML).
    ///
    /// Default: `pipestep.toml` in the current directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Parse the workflow and print the job's steps without starting a
    /// container.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let args = CliArgs::try_parse_from(["pipestep", "run", "ci.yml"]).unwrap();
        let Command::Run(run) = args.command;
        assert_eq!(run.workflow, PathBuf::from("ci.yml"));
        assert_eq!(run.workdir, PathBuf::from("."));
        assert!(run.job.is_none());
        assert!(!run.dry_run);
        assert!(args.log_level.is_none());
    }

    #[test]
    fn run_with_flags() {
        let args = CliArgs::try_parse_from([
            "pipestep",
            "run",
            "ci.yml",
            "--job",
            "test",
            "--workdir",
            "/src",
            "--dry-run",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let Command::Run(run) = args.command;
        assert_eq!(run.job.as_deref(), Some("test"));
        assert_eq!(run.workdir, PathBuf::from("/src"));
        assert!(run.dry_run);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }

    #[test]
    fn workflow_is_required() {
        assert!(CliArgs::try_parse_from(["pipestep", "run"]).is_err());
    }
}
