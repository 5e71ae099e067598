//! Test support for pipestep sessions.
//!
//! [`FakeContainerRuntime`] stands in for docker with scripted step
//! outcomes, [`ScriptedFrontend`] plays the operator, and the builders
//! assemble jobs without going through YAML.

pub mod builders;
pub mod fake_runtime;
pub mod frontend;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

pub use builders::{JobBuilder, StepBuilder};
pub use fake_runtime::{FakeContainerRuntime, Scripted};
pub use frontend::{NoticeLog, ScriptedFrontend, notices_matching};

/// Upper bound on a whole scripted session.
const SESSION_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Route session and dispatcher logs into the test harness.
///
/// Output only shows for failing tests; `RUST_LOG=pipestep=debug` widens
/// the filter.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if a session hangs (a missing `Quit`, a step
/// that never reports back).
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(SESSION_TIMEOUT, f)
        .await
        .expect("session did not finish within the test timeout")
}
