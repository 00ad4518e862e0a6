//! Host system tool search.

use std::path::PathBuf;

use crate::core::target::HostSystem;
use crate::util::process::ProcessBuilder;

/// Looks an executable up on the host system.
pub trait HostSearch: Send + Sync {
    fn find(&self, name: &str, host: &HostSystem) -> Option<PathBuf>;
}

/// The real host search.
///
/// - macOS: `xcrun --find`, which also sees the active developer tools
/// - Linux: a `PATH` search
/// - Windows: `where`
///
/// Other systems never find anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSearch;

impl HostSearch for SystemSearch {
    fn find(&self, name: &str, host: &HostSystem) -> Option<PathBuf> {
        let found = match host {
            HostSystem::Darwin => xcrun_find(name),
            HostSystem::Linux => which::which(name).ok(),
            HostSystem::Windows => where_find(name),
            HostSystem::Other(system) => {
                tracing::debug!("no tool search strategy for {}", system);
                None
            }
        };

        if let Some(path) = &found {
            tracing::trace!("found `{}` at {}", name, path.display());
        }
        found
    }
}

fn xcrun_find(name: &str) -> Option<PathBuf> {
    let output = ProcessBuilder::new("xcrun")
        .args(["--find", name])
        .exec()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    first_line(&output.stdout)
}

fn where_find(name: &str) -> Option<PathBuf> {
    let output = ProcessBuilder::new("where").arg(name).exec().ok()?;
    if !output.status.success() {
        return None;
    }
    first_line(&output.stdout)
}

fn first_line(stdout: &[u8]) -> Option<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}
