//! The version ledger.
//!
//! The ledger maps each dependency key to the version that was last built,
//! the targets it was built for and dependency-specific extra data. It is
//! persisted as a single JSON document under the build root:
//!
//! ```json
//! {
//!   "glad": {
//!     "opengl_version": "4.6",
//!     "targets": ["linux-x86_64"],
//!     "version": "0.1.33"
//!   }
//! }
//! ```
//!
//! The whole document is rewritten on every flush, so the file on disk is
//! consistent after each completed dependency build.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::core::dependency::{DependencyKey, VersionData};
use crate::core::target::TargetId;
use crate::deps::DependencyError;

/// Keys of a ledger entry that version data may not use.
pub const RESERVED_VERSION_KEYS: [&str; 2] = ["version", "targets"];

/// Reject version data whose keys would shadow the fields of a ledger entry.
pub fn check_version_data(name: &str, data: &VersionData) -> Result<(), DependencyError> {
    match RESERVED_VERSION_KEYS.iter().find(|key| data.contains_key(**key)) {
        Some(key) => Err(DependencyError::ReservedVersionData {
            name: name.to_string(),
            key: key.to_string(),
        }),
        None => Ok(()),
    }
}

/// Ledger entry for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Version that was built
    pub version: String,

    /// Targets the version was built for
    pub targets: BTreeSet<TargetId>,

    /// Dependency-specific comparison keys
    #[serde(flatten)]
    pub extra: VersionData,
}

impl VersionRecord {
    /// Create a record for a version built for a single target.
    pub fn new(version: impl Into<String>, target: TargetId, extra: Option<VersionData>) -> Self {
        VersionRecord {
            version: version.into(),
            targets: BTreeSet::from([target]),
            extra: extra.unwrap_or_default(),
        }
    }

    /// Check whether this record satisfies `version` for `target`.
    ///
    /// Every key in `required` must be present in the record's extra data
    /// with an equal value.
    pub fn satisfies(
        &self,
        version: &str,
        target: &TargetId,
        required: Option<&VersionData>,
    ) -> bool {
        if self.version != version || !self.targets.contains(target) {
            return false;
        }

        required.map_or(true, |required| {
            required.iter().all(|(key, value)| {
                match self.extra.get(key) {
                    Some(recorded) => {
                        tracing::trace!("recorded value of `{}` is {}", key, recorded);
                        recorded == value
                    }
                    None => {
                        tracing::trace!("`{}` is not yet in the recorded version data", key);
                        false
                    }
                }
            })
        })
    }
}

/// In-memory ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionLedger {
    records: BTreeMap<DependencyKey, VersionRecord>,
}

impl VersionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record of a dependency.
    pub fn get(&self, key: &DependencyKey) -> Option<&VersionRecord> {
        self.records.get(key)
    }

    /// Insert or overwrite the record of a dependency.
    pub fn record(&mut self, key: DependencyKey, record: VersionRecord) {
        self.records.insert(key, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DependencyKey, &VersionRecord)> {
        self.records.iter()
    }

    /// Serialize as pretty-printed JSON with every object's keys sorted.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        // `Value` objects are backed by a sorted map, which also orders the
        // flattened extra keys among `version` and `targets`.
        let value = serde_json::to_value(self)?;
        let mut json = serde_json::to_string_pretty(&value)?;
        json.push('\n');
        Ok(json)
    }
}

/// Durable storage for the ledger.
pub trait LedgerStore {
    /// Load the ledger; an absent backing file yields an empty ledger.
    fn load(&mut self) -> Result<VersionLedger, DependencyError>;

    /// Persist the full ledger.
    ///
    /// `is_final` marks the flush at the end of a dependency pass and only
    /// changes logging.
    fn flush(&mut self, ledger: &VersionLedger, is_final: bool) -> Result<(), DependencyError>;
}

/// Ledger persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonLedgerFile {
    path: PathBuf,
    dry_run: bool,
}

impl JsonLedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonLedgerFile {
            path: path.into(),
            dry_run: false,
        }
    }

    /// Keep flushes in memory only.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> DependencyError {
        DependencyError::LedgerIo {
            path: self.path.clone(),
            source,
        }
    }

    fn serialize_error(&self, source: serde_json::Error) -> DependencyError {
        DependencyError::LedgerSerialize {
            path: self.path.clone(),
            source,
        }
    }

    fn write_atomic(&self, contents: &str) -> Result<(), DependencyError> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;

        let mut file = NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.as_file().sync_all().map_err(|e| self.io_error(e))?;
        file.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

impl LedgerStore for JsonLedgerFile {
    fn load(&mut self) -> Result<VersionLedger, DependencyError> {
        if !self.path.is_file() {
            tracing::debug!(
                "no version file at {}, starting from an empty ledger",
                self.path.display()
            );
            return Ok(VersionLedger::new());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_str(&contents).map_err(|source| DependencyError::MalformedLedger {
            path: self.path.clone(),
            source,
        })
    }

    fn flush(&mut self, ledger: &VersionLedger, is_final: bool) -> Result<(), DependencyError> {
        if self.dry_run {
            tracing::debug!("dry run: not writing {}", self.path.display());
            return Ok(());
        }

        let json = ledger
            .to_json()
            .map_err(|source| self.serialize_error(source))?;
        self.write_atomic(&json)?;

        if is_final {
            tracing::debug!(
                "wrote the final dependency versions to {}",
                self.path.display()
            );
        } else {
            tracing::trace!("wrote the dependency versions to {}", self.path.display());
        }
        Ok(())
    }
}
