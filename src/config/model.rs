// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Settings as read from TOML, before validation.
///
/// ```toml
/// [runtime]
/// binary = "docker"
/// shell = "bash"
/// stop_timeout_secs = 3
/// container_prefix = "pipestep"
///
/// [images]
/// "ubuntu-latest" = "ubuntu:24.04"
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    #[serde(default)]
    pub runtime: RuntimeSection,

    /// Extra or overriding `runs-on` label → image mappings.
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

/// `[runtime]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    /// Container CLI executable (`docker`, or a compatible drop-in).
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Shell used to run step commands, invoked as `<shell> -euo pipefail -c`.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Seconds `stop` waits before the container is killed during teardown.
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,

    /// Prefix of the per-session container name.
    #[serde(default = "default_container_prefix")]
    pub container_prefix: String,
}

fn default_binary() -> String {
    "docker".to_string()
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_stop_timeout_secs() -> u64 {
    3
}

fn default_container_prefix() -> String {
    "pipestep".to_string()
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            shell: default_shell(),
            stop_timeout_secs: default_stop_timeout_secs(),
            container_prefix: default_container_prefix(),
        }
    }
}

/// Validated settings. Only constructible through `TryFrom<RawSettings>`
/// (or [`Settings::default`]).
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub runtime: RuntimeSection,
    pub images: BTreeMap<String, String>,
}

impl Settings {
    pub(crate) fn new_unchecked(runtime: RuntimeSection, images: BTreeMap<String, String>) -> Self {
        Self { runtime, images }
    }
}
