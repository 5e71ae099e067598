// src/parser/images.rs

use std::collections::BTreeMap;

/// Image used for any `runs-on` label without a mapping.
pub const FALLBACK_IMAGE: &str = "ubuntu:22.04";

const BUILTIN_IMAGES: &[(&str, &str)] = &[
    ("ubuntu-latest", "ubuntu:22.04"),
    ("ubuntu-24.04", "ubuntu:24.04"),
    ("ubuntu-22.04", "ubuntu:22.04"),
    ("ubuntu-20.04", "ubuntu:20.04"),
];

/// `runs-on` label → container image lookup.
#[derive(Debug, Clone)]
pub struct ImageMap {
    images: BTreeMap<String, String>,
}

impl Default for ImageMap {
    fn default() -> Self {
        Self {
            images: BUILTIN_IMAGES
                .iter()
                .map(|(label, image)| (label.to_string(), image.to_string()))
                .collect(),
        }
    }
}

impl ImageMap {
    /// Built-in mappings with `overrides` layered on top.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut map = Self::default();
        map.images.extend(overrides.clone());
        map
    }

    /// Resolve a label. `Err` carries the fallback image for unknown labels.
    pub fn resolve(&self, runs_on: &str) -> Result<&str, &'static str> {
        self.images
            .get(runs_on)
            .map(String::as_str)
            .ok_or(FALLBACK_IMAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_labels_resolve() {
        let map = ImageMap::default();
        assert_eq!(map.resolve("ubuntu-latest"), Ok("ubuntu:22.04"));
        assert_eq!(map.resolve("ubuntu-20.04"), Ok("ubuntu:20.04"));
    }

    #[test]
    fn unknown_label_reports_fallback() {
        let map = ImageMap::default();
        assert_eq!(map.resolve("macos-latest"), Err(FALLBACK_IMAGE));
    }

    #[test]
    fn overrides_replace_and_extend() {
        let overrides = BTreeMap::from([
            ("ubuntu-latest".to_string(), "ubuntu:24.04".to_string()),
            ("self-hosted".to_string(), "debian:12".to_string()),
        ]);
        let map = ImageMap::with_overrides(&overrides);
        assert_eq!(map.resolve("ubuntu-latest"), Ok("ubuntu:24.04"));
        assert_eq!(map.resolve("self-hosted"), Ok("debian:12"));
        assert_eq!(map.resolve("ubuntu-22.04"), Ok("ubuntu:22.04"));
    }
}
