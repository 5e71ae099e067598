// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawSettings, Settings};
use crate::errors::Result;

/// Read and deserialize a settings file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawSettings = toml::from_str(&contents)?;
    Ok(raw)
}

/// Read, deserialize and validate a settings file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Settings> {
    let raw = load_from_path(&path)?;
    Settings::try_from(raw)
}

/// Resolve settings for a run.
///
/// - An explicitly given path must exist and be valid.
/// - Otherwise [`default_config_path`] is used if present, and built-in
///   defaults if not.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let path = default_config_path();
    if path.is_file() {
        debug!(path = %path.display(), "loading default settings file");
        load_and_validate(&path)
    } else {
        debug!("no settings file found; using defaults");
        Ok(Settings::default())
    }
}

/// `pipestep.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("pipestep.toml")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::errors::PipestepError;

    fn write_settings(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_settings("");
        let settings = load_and_validate(file.path()).unwrap();
        assert_eq!(settings.runtime.binary, "docker");
        assert_eq!(settings.runtime.shell, "bash");
        assert_eq!(settings.runtime.stop_timeout_secs, 3);
        assert_eq!(settings.runtime.container_prefix, "pipestep");
        assert!(settings.images.is_empty());
    }

    #[test]
    fn reads_runtime_and_images() {
        let file = write_settings(
            r#"
[runtime]
binary = "podman"
stop_timeout_secs = 10

[images]
"ubuntu-latest" = "ubuntu:24.04"
"self-hosted" = "debian:12"
"#,
        );
        let settings = load_and_validate(file.path()).unwrap();
        assert_eq!(settings.runtime.binary, "podman");
        assert_eq!(settings.runtime.shell, "bash");
        assert_eq!(settings.runtime.stop_timeout_secs, 10);
        assert_eq!(settings.images["self-hosted"], "debian:12");
    }

    #[test]
    fn rejects_excessive_stop_timeout() {
        let file = write_settings("[runtime]\nstop_timeout_secs = 9000\n");
        match load_and_validate(file.path()) {
            Err(PipestepError::ConfigError(msg)) => assert!(msg.contains("stop_timeout_secs")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_image() {
        let file = write_settings("[images]\n\"ubuntu-latest\" = \"\"\n");
        assert!(matches!(
            load_and_validate(file.path()),
            Err(PipestepError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let file = write_settings("[runtime]\nengine = \"docker\"\n");
        assert!(matches!(
            load_and_validate(file.path()),
            Err(PipestepError::TomlError(_))
        ));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load_or_default(Some(&missing)),
            Err(PipestepError::IoError(_))
        ));
    }
}
