// src/console/mod.rs

//! Line-oriented terminal presentation layer.
//!
//! - [`render`] turns controller notices into text (the [`ConsoleFrontend`]).
//! - [`input`] reads operator commands from stdin on a dedicated thread.
//!
//! The console only observes the controller and sends it commands; it
//! never changes session state itself.

pub mod input;
pub mod render;

pub use input::{HELP_TEXT, read_commands, spawn_input_reader};
pub use render::{ConsoleFrontend, PROMPT, status_icon, step_line};
