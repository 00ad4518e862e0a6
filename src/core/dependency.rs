//! Dependency descriptors.
//!
//! A descriptor is the static, pluggable behavior bundle for one
//! third-party dependency: its identity, declared version, the keys of the
//! dependencies it requires, where its source comes from, and how it is
//! built.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::builder::context::BuildContext;
use crate::core::target::TargetId;
use crate::deps::ledger::VersionRecord;
use crate::sources::SourceSpec;

/// Dependency-specific comparison data stored next to the version.
pub type VersionData = BTreeMap<String, String>;

/// Stable identifier of a dependency, unique across the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyKey(String);

impl DependencyKey {
    pub fn new(key: impl Into<String>) -> Self {
        DependencyKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DependencyKey {
    fn from(s: &str) -> Self {
        DependencyKey(s.to_string())
    }
}

impl Borrow<str> for DependencyKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Behavior bundle for one dependency.
pub trait DependencyDescriptor {
    /// Registry key of the dependency.
    fn key(&self) -> &DependencyKey;

    /// Human-readable name for output.
    fn display_name(&self) -> &str;

    /// The currently declared version.
    fn version(&self) -> &str;

    /// Keys of the dependencies that must be built before this one.
    fn prerequisites(&self) -> &[DependencyKey] {
        &[]
    }

    /// Extra comparison keys a ledger record must carry with equal values.
    fn custom_version_data(&self) -> Option<VersionData> {
        None
    }

    /// Where the source of the dependency is fetched from.
    fn source(&self) -> Option<SourceSpec> {
        None
    }

    /// Check whether a ledger record satisfies this dependency for `target`.
    fn is_satisfied(&self, record: Option<&VersionRecord>, target: &TargetId) -> bool {
        record.is_some_and(|record| {
            record.satisfies(self.version(), target, self.custom_version_data().as_ref())
        })
    }

    /// Check that the fetched source of the dependency is present.
    ///
    /// A dry run never fetches anything, so every source counts as present.
    fn source_available(&self, ctx: &BuildContext) -> bool {
        ctx.fs.is_dry_run() || ctx.layout
                .dependency_source_dir(self.key(), self.version())
                .exists()
    }

    /// Build and install the dependency.
    ///
    /// Returns the extra data to record in the ledger.
    fn build(&self, ctx: &BuildContext) -> Result<Option<VersionData>>;
}

impl fmt::Debug for dyn DependencyDescriptor + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyDescriptor")
            .field("key", self.key())
            .field("version", &self.version())
            .field("prerequisites", &self.prerequisites())
            .finish()
    }
}
