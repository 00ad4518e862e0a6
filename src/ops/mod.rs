//! High-level operations.
//!
//! This module contains the implementation of the couplet run modes.

pub mod bootstrap;
pub mod clone;
pub mod invoke;
pub mod preset;
pub mod set_up;
pub mod status;

pub use bootstrap::{bootstrap, fetch_sources};
pub use clone::{clone_project, DEFAULT_REPOSITORY};
pub use invoke::{invoke, invoke_with, ComposeOptions, InvocationOptions, RunMode};
pub use preset::{run_preset, PresetError, PresetOptions, PresetRunMode, PresetSet};
pub use set_up::set_up;
pub use status::{dependency_status, format_status, status, DependencyStatus};
