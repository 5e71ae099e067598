// src/container/baseline.rs

//! Container naming and the baseline environment every session starts with.

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::model::{EnvMap, WORKSPACE_PATH};

/// Source-control identifiers probed from the host working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitInfo {
    pub sha: Option<String>,
    /// Full ref, e.g. `refs/heads/main`. `None` on a detached HEAD.
    pub reference: Option<String>,
}

/// Deterministic container name: `<prefix>-<job>-<pid>`.
///
/// The job name is reduced to characters the container runtime accepts.
pub fn container_name(prefix: &str, job_name: &str, pid: u32) -> String {
    let job: String = job_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let job = job.trim_matches('-');
    let job = if job.is_empty() { "job" } else { job };
    format!("{prefix}-{job}-{pid}")
}

/// CI markers plus whatever source-control identifiers could be probed.
pub fn baseline_env(git: &GitInfo) -> EnvMap {
    let mut env = EnvMap::new();
    env.insert("CI".into(), "true".into());
    env.insert("GITHUB_ACTIONS".into(), "true".into());
    env.insert("GITHUB_WORKSPACE".into(), WORKSPACE_PATH.into());
    env.insert("DEBIAN_FRONTEND".into(), "noninteractive".into());

    if let Some(ref sha) = git.sha {
        env.insert("GITHUB_SHA".into(), sha.clone());
    }
    if let Some(ref reference) = git.reference {
        env.insert("GITHUB_REF".into(), reference.clone());
        let short = reference
            .strip_prefix("refs/heads/")
            .or_else(|| reference.strip_prefix("refs/tags/"))
            .unwrap_or(reference);
        env.insert("GITHUB_REF_NAME".into(), short.to_string());
    }
    env
}

/// Best-effort probe of the host directory's git revision and ref.
pub async fn probe_git(dir: &Path) -> GitInfo {
    let info = GitInfo {
        sha: git_output(dir, &["rev-parse", "HEAD"]).await,
        reference: git_output(dir, &["symbolic-ref", "-q", "HEAD"]).await,
    };
    debug!(dir = %dir.display(), ?info, "probed git identifiers");
    info
}

async fn git_output(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
