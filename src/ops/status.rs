//! Dependency status report.

use anyhow::Result;

use crate::core::registry::DependencyRegistry;
use crate::core::target::TargetId;
use crate::deps::{
    default_registry, DependencyError, JsonLedgerFile, LedgerStore, RegistryOptions,
    VersionLedger,
};
use crate::util::context::GlobalContext;

/// The state of one declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    pub key: String,
    pub name: String,
    pub version: String,
    /// Version recorded in the ledger, if any
    pub recorded: Option<String>,
    /// Whether the ledger satisfies the dependency for the target
    pub satisfied: bool,
}

/// Report every declared dependency in build order.
pub fn dependency_status(
    registry: &DependencyRegistry,
    ledger: &VersionLedger,
    target: &TargetId,
) -> Result<Vec<DependencyStatus>, DependencyError> {
    Ok(registry
        .build_order()?
        .into_iter()
        .map(|descriptor| {
            let record = ledger.get(descriptor.key());
            DependencyStatus {
                key: descriptor.key().to_string(),
                name: descriptor.display_name().to_string(),
                version: descriptor.version().to_string(),
                recorded: record.map(|r| r.version.clone()),
                satisfied: descriptor.is_satisfied(record, target),
            }
        })
        .collect())
}

/// Report the declared dependencies against the ledger of the workspace.
pub fn status(
    gctx: &GlobalContext,
    target: &TargetId,
    options: &RegistryOptions,
) -> Result<Vec<DependencyStatus>> {
    let layout = gctx.layout(target.clone());
    let registry = default_registry(options)?;
    let ledger = JsonLedgerFile::new(&layout.ledger_path).load()?;
    Ok(dependency_status(&registry, &ledger, target)?)
}

/// Format a status report as aligned lines.
pub fn format_status(statuses: &[DependencyStatus]) -> String {
    let width = statuses.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = String::new();

    for status in statuses {
        let state = match (&status.recorded, status.satisfied) {
            (_, true) => "up to date".to_string(),
            (Some(recorded), false) if *recorded != status.version => {
                format!("outdated (built {})", recorded)
            }
            (_, false) => "not built".to_string(),
        };
        out.push_str(&format!(
            "{:<width$}  {:<10}  {}\n",
            status.name,
            status.version,
            state,
            width = width
        ));
    }

    out
}
