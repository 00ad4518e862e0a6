//! The dependency pass.
//!
//! Decides which declared dependencies are out of date for the current
//! target, builds them in prerequisite order and records the result in the
//! version ledger.

pub mod errors;
pub mod ledger;
pub mod recipes;
pub mod walker;

pub use errors::DependencyError;
pub use ledger::{JsonLedgerFile, LedgerStore, VersionLedger, VersionRecord};
pub use recipes::{default_registry, RegistryOptions};
pub use walker::{run_dependency_pass, DependencyWalker};
