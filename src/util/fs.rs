//! Filesystem utilities.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Recursively copy a directory.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("failed to read directory: {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// File-system mutations that honor dry-run mode.
///
/// All operations tolerate pre-existing targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystem {
    dry_run: bool,
}

impl FileSystem {
    pub fn new(dry_run: bool) -> Self {
        FileSystem { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    pub fn makedirs(&self, path: &Path) -> Result<()> {
        tracing::debug!("+ mkdir -p {}", path.display());
        if self.dry_run {
            return Ok(());
        }
        ensure_dir(path)
    }

    /// Copy a file or a directory tree.
    pub fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        tracing::debug!("+ cp -R {} {}", src.display(), dst.display());
        if self.dry_run {
            return Ok(());
        }

        if src.is_dir() {
            copy_dir_all(src, dst)
        } else {
            if let Some(parent) = dst.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(src, dst)
                .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
            Ok(())
        }
    }

    pub fn remove_tree(&self, path: &Path) -> Result<()> {
        tracing::debug!("+ rm -rf {}", path.display());
        if self.dry_run {
            return Ok(());
        }
        remove_dir_all_if_exists(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_dir_all() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        fs::create_dir_all(src.join("include")).unwrap();
        fs::write(src.join("include").join("stb_image.h"), "// stb").unwrap();

        copy_dir_all(&src, &dst).unwrap();

        assert_eq!(
            fs::read_to_string(dst.join("include").join("stb_image.h")).unwrap(),
            "// stb"
        );
    }

    #[test]
    fn test_file_system_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let fs_helper = FileSystem::new(false);
        let dir = tmp.path().join("a").join("b");

        fs_helper.makedirs(&dir).unwrap();
        fs_helper.makedirs(&dir).unwrap();
        assert!(dir.is_dir());

        fs_helper.remove_tree(&tmp.path().join("a")).unwrap();
        fs_helper.remove_tree(&tmp.path().join("a")).unwrap();
        assert!(!fs_helper.exists(&dir));
    }

    #[test]
    fn test_dry_run_does_not_touch_disk() {
        let tmp = TempDir::new().unwrap();
        let fs_helper = FileSystem::new(true);
        let dir = tmp.path().join("build");

        fs_helper.makedirs(&dir).unwrap();
        assert!(!dir.exists());
    }
}
