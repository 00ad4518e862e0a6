//! Workspace set-up.

use anyhow::{Context, Result};

use crate::util::context::WorkspaceLayout;
use crate::util::fs::FileSystem;
use crate::util::shell::{Shell, Status};

/// Create the build directories of `layout`.
///
/// With `clean`, the whole build root is removed first.
pub fn set_up(layout: &WorkspaceLayout, fs: &FileSystem, clean: bool, shell: &Shell) -> Result<()> {
    if clean {
        shell.status(Status::Removed, layout.build_root.display());
        fs.remove_tree(&layout.build_root)
            .with_context(|| format!("failed to clean {}", layout.build_root.display()))?;
    }

    for dir in layout.directories() {
        fs.makedirs(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    tracing::debug!("the build root is {}", layout.build_root.display());
    Ok(())
}
