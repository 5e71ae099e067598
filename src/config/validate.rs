// src/config/validate.rs

use crate::config::model::{RawSettings, Settings};
use crate::errors::{PipestepError, Result};

/// Upper bound on the teardown stop timeout.
const MAX_STOP_TIMEOUT_SECS: u64 = 300;

impl TryFrom<RawSettings> for Settings {
    type Error = PipestepError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_runtime(&raw)?;
        validate_images(&raw)?;
        Ok(Settings::new_unchecked(raw.runtime, raw.images))
    }
}

fn validate_runtime(raw: &RawSettings) -> Result<()> {
    let rt = &raw.runtime;

    for (field, value) in [
        ("binary", &rt.binary),
        ("shell", &rt.shell),
        ("container_prefix", &rt.container_prefix),
    ] {
        if value.trim().is_empty() {
            return Err(PipestepError::ConfigError(format!(
                "[runtime].{field} must not be empty"
            )));
        }
    }

    if rt.stop_timeout_secs > MAX_STOP_TIMEOUT_SECS {
        return Err(PipestepError::ConfigError(format!(
            "[runtime].stop_timeout_secs must be <= {MAX_STOP_TIMEOUT_SECS} (got {})",
            rt.stop_timeout_secs
        )));
    }

    Ok(())
}

fn validate_images(raw: &RawSettings) -> Result<()> {
    for (label, image) in raw.images.iter() {
        if label.trim().is_empty() {
            return Err(PipestepError::ConfigError(
                "[images] contains an empty runs-on label".to_string(),
            ));
        }
        if image.trim().is_empty() {
            return Err(PipestepError::ConfigError(format!(
                "[images].\"{label}\" maps to an empty image reference"
            )));
        }
    }
    Ok(())
}
