// tests/docker_runtime.rs
//
// These talk to a real container daemon and pull `ubuntu:22.04`; run with
// `cargo test -- --ignored` on a machine with docker available.

use std::collections::BTreeMap;

use tempfile::TempDir;

use pipestep::config::RuntimeSection;
use pipestep::container::{ContainerRuntime, DockerRuntime, ExecRequest, ProvisionSpec};
use pipestep::errors::{ExecutionError, SetupError};
use pipestep_test_utils::init_tracing;

fn spec(dir: &TempDir) -> ProvisionSpec {
    ProvisionSpec {
        job_name: "docker it".into(),
        image: "ubuntu:22.04".into(),
        env: BTreeMap::from([("FROM_JOB".to_string(), "yes".to_string())]),
        host_dir: dir.path().to_path_buf(),
    }
}

fn exec(command: &str) -> ExecRequest {
    ExecRequest {
        command: command.into(),
        env: BTreeMap::new(),
        working_directory: "/workspace".into(),
    }
}

#[tokio::test]
#[ignore = "needs a docker daemon"]
async fn provision_execute_inspect_teardown() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "hello").unwrap();

    let runtime = DockerRuntime::new(&RuntimeSection::default(), "docker it");
    runtime.provision(spec(&dir)).await.unwrap();

    let ok = runtime.execute(exec("cat marker.txt && echo err >&2")).await.unwrap();
    assert_eq!(ok.exit_code, 0);
    assert_eq!(ok.stdout, "hello");
    assert_eq!(ok.stderr.trim(), "err");

    // Strict shell: the failing command stops the script.
    let failed = runtime.execute(exec("false; echo unreachable")).await.unwrap();
    assert_eq!(failed.exit_code, 1);
    assert!(!failed.stdout.contains("unreachable"));

    // Writes land on the host.
    runtime.execute(exec("touch created.txt")).await.unwrap();
    assert!(dir.path().join("created.txt").exists());

    let files = runtime.list_files("/workspace".into()).await;
    assert!(files.contains(&"marker.txt".to_string()));

    let env = runtime.dump_environment().await;
    assert_eq!(env.get("CI").map(String::as_str), Some("true"));
    assert_eq!(env.get("FROM_JOB").map(String::as_str), Some("yes"));

    runtime.teardown().await;
    runtime.teardown().await;

    assert_eq!(
        runtime.execute(exec("true")).await.unwrap_err(),
        ExecutionError::NoContainer
    );
}

#[tokio::test]
#[ignore = "needs a docker daemon"]
async fn unknown_image_fails_setup() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let runtime = DockerRuntime::new(&RuntimeSection::default(), "missing image");
    let mut spec = spec(&dir);
    spec.image = "pipestep.invalid/does-not-exist:never".into();

    let err = runtime.provision(spec).await.unwrap_err();
    assert!(matches!(err, SetupError::ImageUnavailable { .. }));
    runtime.teardown().await;
}
