//! Couplet Composer - builds the Obliging Ode and Unsung Anthem projects
//!
//! This crate provides the library functionality behind the `couplet`
//! binary: the version ledger, the dependency walker and recipes, toolchain
//! resolution and the configure, compose and preset run modes.

pub mod builder;
pub mod core;
pub mod deps;
pub mod ops;
pub mod sources;
pub mod toolchain;
pub mod util;

/// Test utilities and fakes for couplet unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides scripted dependencies, ledger stores, tool
/// searches and source fetchers.
#[cfg(test)]
pub mod test_support;

pub use core::{DependencyDescriptor, DependencyKey, DependencyRegistry, TargetId};
pub use deps::{DependencyWalker, VersionLedger};
pub use util::context::GlobalContext;
