// src/config/mod.rs

//! Optional `pipestep.toml` settings: which container CLI to drive, the
//! strict shell used for step commands, and extra `runs-on` image mappings.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{RawSettings, RuntimeSection, Settings};
