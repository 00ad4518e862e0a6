//! Test doubles for couplet unit tests.
//!
//! Recording stand-ins for the seams of the dependency pass and the
//! toolchain resolver: a scripted dependency descriptor, an in-memory
//! ledger store, a fake host search and a static tool descriptor.
//!
//! # Example
//!
//! ```rust,ignore
//! use couplet::test_support::{test_context, RecordingStore, ScriptedDependency};
//!
//! #[test]
//! fn test_example() {
//!     let tmp = tempfile::TempDir::new().unwrap();
//!     let ctx = test_context(tmp.path(), "linux-x86_64");
//!     let lib = ScriptedDependency::new("liba", "1.0");
//!     let builds = lib.build_counter();
//!
//!     // Put the dependency in a registry and walk it...
//! }
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

use crate::builder::context::BuildContext;
use crate::core::dependency::{DependencyDescriptor, DependencyKey, VersionData};
use crate::core::target::{HostSystem, TargetId};
use crate::deps::ledger::{LedgerStore, VersionLedger};
use crate::deps::DependencyError;
use crate::toolchain::search::HostSearch;
use crate::toolchain::{ToolDescriptor, ToolInstaller, ToolRole};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Shared count of `build` calls.
#[derive(Debug, Clone, Default)]
pub struct BuildCounter(Arc<AtomicUsize>);

impl BuildCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Shared, ordered log of built dependency keys.
#[derive(Debug, Clone, Default)]
pub struct BuildLog(Arc<Mutex<Vec<String>>>);

impl BuildLog {
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, key: &DependencyKey) {
        if let Ok(mut entries) = self.0.lock() {
            entries.push(key.to_string());
        }
    }
}

/// A dependency whose build only records that it happened.
#[derive(Debug, Clone)]
pub struct ScriptedDependency {
    key: DependencyKey,
    version: String,
    prerequisites: Vec<DependencyKey>,
    extra: Option<VersionData>,
    built_extra: Option<VersionData>,
    fails: bool,
    has_source: bool,
    counter: BuildCounter,
    log: BuildLog,
}

impl ScriptedDependency {
    pub fn new(key: &str, version: &str) -> Self {
        ScriptedDependency {
            key: DependencyKey::new(key),
            version: version.to_string(),
            prerequisites: Vec::new(),
            extra: None,
            built_extra: None,
            fails: false,
            has_source: true,
            counter: BuildCounter::default(),
            log: BuildLog::default(),
        }
    }

    pub fn requires(mut self, key: &str) -> Self {
        self.prerequisites.push(DependencyKey::new(key));
        self
    }

    /// Require `key` with `value` in the ledger and record it when built.
    pub fn with_extra(mut self, key: &str, value: &str) -> Self {
        self.extra
            .get_or_insert_with(VersionData::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Make `build` fail.
    /// Version data returned by the build only, not declared up front.
    pub fn building_extra(mut self, key: &str, value: &str) -> Self {
        self.built_extra
            .get_or_insert_with(VersionData::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fails = true;
        self
    }

    /// Pretend the source was never fetched.
    pub fn without_source(mut self) -> Self {
        self.has_source = false;
        self
    }

    /// Share a build log with other dependencies.
    pub fn with_build_log(mut self, log: BuildLog) -> Self {
        self.log = log;
        self
    }

    pub fn build_counter(&self) -> BuildCounter {
        self.counter.clone()
    }

    pub fn build_log(&self) -> BuildLog {
        self.log.clone()
    }

    pub fn boxed(self) -> Box<dyn DependencyDescriptor> {
        Box::new(self)
    }
}

impl DependencyDescriptor for ScriptedDependency {
    fn key(&self) -> &DependencyKey {
        &self.key
    }

    fn display_name(&self) -> &str {
        self.key.as_str()
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn prerequisites(&self) -> &[DependencyKey] {
        &self.prerequisites
    }

    fn custom_version_data(&self) -> Option<VersionData> {
        self.extra.clone()
    }

    fn source_available(&self, _ctx: &BuildContext) -> bool {
        self.has_source
    }

    fn build(&self, _ctx: &BuildContext) -> Result<Option<VersionData>> {
        self.counter.increment();
        self.log.push(&self.key);
        if self.fails {
            bail!("scripted failure of {}", self.key);
        }
        Ok(self.built_extra.clone().or_else(|| self.extra.clone()))
    }
}

/// Ledger store that keeps every flushed state in memory.
#[derive(Debug, Default)]
pub struct RecordingStore {
    initial: VersionLedger,
    flushes: Vec<(VersionLedger, bool)>,
}

impl RecordingStore {
    /// A store whose `load` returns `ledger`.
    pub fn with_ledger(ledger: VersionLedger) -> Self {
        RecordingStore {
            initial: ledger,
            flushes: Vec::new(),
        }
    }

    /// Every flushed ledger with its `is_final` flag.
    pub fn flushes(&self) -> Vec<(VersionLedger, bool)> {
        self.flushes.clone()
    }
}

impl LedgerStore for RecordingStore {
    fn load(&mut self) -> Result<VersionLedger, DependencyError> {
        Ok(self.initial.clone())
    }

    fn flush(&mut self, ledger: &VersionLedger, is_final: bool) -> Result<(), DependencyError> {
        self.flushes.push((ledger.clone(), is_final));
        Ok(())
    }
}

/// Host search over a fixed table of executables.
#[derive(Debug, Default)]
pub struct FakeSearch {
    tools: HashMap<String, PathBuf>,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.tools.insert(name.to_string(), path.into());
        self
    }

    /// Names looked up so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl HostSearch for FakeSearch {
    fn find(&self, name: &str, _host: &HostSystem) -> Option<PathBuf> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(name.to_string());
        }
        self.tools.get(name).cloned()
    }
}

/// Installer that reports a fixed path without doing anything.
#[derive(Debug, Clone)]
pub struct StaticInstaller(PathBuf);

impl ToolInstaller for StaticInstaller {
    fn install(&self, _version: &str, _ctx: &BuildContext) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}

/// Tool descriptor with a fixed name and optional pinned version.
///
/// A pinned tool is installed locally at
/// `<tools root>/<name>-<version>/bin/<name>`.
#[derive(Debug, Clone)]
pub struct StaticTool {
    role: ToolRole,
    name: String,
    version: Option<String>,
    installer: Option<StaticInstaller>,
}

impl StaticTool {
    pub fn new(role: ToolRole, name: &str) -> Self {
        StaticTool {
            role,
            name: name.to_string(),
            version: None,
            installer: None,
        }
    }

    pub fn pinned(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn installs_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.installer = Some(StaticInstaller(path.into()));
        self
    }
}

impl ToolDescriptor for StaticTool {
    fn role(&self) -> ToolRole {
        self.role
    }

    fn search_name(&self) -> String {
        self.name.clone()
    }

    fn required_local_version(&self, _target: &TargetId, _host: &HostSystem) -> Option<String> {
        self.version.clone()
    }

    fn local_executable(
        &self,
        tools_root: &Path,
        version: &str,
        _target: &TargetId,
        _host: &HostSystem,
    ) -> Option<PathBuf> {
        self.version.as_ref()?;
        Some(
            tools_root
                .join(format!("{}-{}", self.name, version))
                .join("bin")
                .join(&self.name),
        )
    }

    fn installer(&self) -> Option<&dyn ToolInstaller> {
        self.installer.as_ref().map(|i| i as &dyn ToolInstaller)
    }
}
