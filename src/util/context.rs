//! Global context for couplet operations.
//!
//! Provides access to the loaded configuration and the workspace layout.
//! The context is built once per invocation and passed down explicitly.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::dependency::DependencyKey;
use crate::core::options::BuildVariant;
use crate::core::target::TargetId;
use crate::util::config::{self, Config};

/// Name of the build root directory under the source root.
pub const BUILD_ROOT_NAME: &str = "build";

/// Name of the ledger file under the build root.
pub const LEDGER_FILE_NAME: &str = "versions.json";

/// Directories an invocation reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    /// Target the layout is resolved for
    pub target: TargetId,

    /// Directory the invocation runs in
    pub source_root: PathBuf,

    /// All build output lives under this directory
    pub build_root: PathBuf,

    /// Install prefix of the built dependencies
    pub dependencies_root: PathBuf,

    /// Install prefix of the locally installed tools
    pub tools_root: PathBuf,

    /// Downloaded sources and scratch space
    pub temporary_root: PathBuf,

    /// The version ledger file
    pub ledger_path: PathBuf,
}

impl WorkspaceLayout {
    /// Resolve the layout with the default build root.
    pub fn new(source_root: impl Into<PathBuf>, target: TargetId) -> Self {
        let source_root = source_root.into();
        let build_root = source_root.join(BUILD_ROOT_NAME);
        Self::with_build_root(source_root, build_root, target)
    }

    /// Resolve the layout under a custom build root.
    pub fn with_build_root(
        source_root: impl Into<PathBuf>,
        build_root: impl Into<PathBuf>,
        target: TargetId,
    ) -> Self {
        let source_root = source_root.into();
        let build_root = build_root.into();
        let build_root = if build_root.is_absolute() {
            build_root
        } else {
            source_root.join(build_root)
        };

        WorkspaceLayout {
            dependencies_root: build_root.join("dependencies").join(target.as_str()),
            tools_root: build_root.join("tools").join(target.as_str()),
            temporary_root: build_root.join("temp"),
            ledger_path: build_root.join(LEDGER_FILE_NAME),
            source_root,
            build_root,
            target,
        }
    }

    /// Where the source of one version of a dependency is fetched to.
    ///
    /// Each version gets its own directory, so a checkout of an older
    /// version is never mistaken for the declared one.
    pub fn dependency_source_dir(&self, key: &DependencyKey, version: &str) -> PathBuf {
        self.temporary_root.join(format!("{}-{}", key, version))
    }

    /// Where a CMake dependency is configured and built.
    pub fn dependency_build_dir(&self, key: &DependencyKey) -> PathBuf {
        self.temporary_root.join("build").join(key.as_str())
    }

    /// Where the source of one version of a tool is fetched to.
    pub fn tool_source_dir(&self, name: &str, version: &str) -> PathBuf {
        self.temporary_root
            .join("tools")
            .join(format!("{}-{}", name, version))
    }

    /// Where the project repository is cloned to.
    pub fn project_source_dir(&self, repository: &str) -> PathBuf {
        self.source_root.join(repository)
    }

    /// Where the project is configured and built.
    pub fn project_build_dir(&self, variant: BuildVariant) -> PathBuf {
        self.build_root
            .join(format!("{}-{}", variant.dir_name(), self.target))
    }

    /// Directories created by the set-up step.
    pub fn directories(&self) -> [&Path; 4] {
        [
            &self.build_root,
            &self.dependencies_root,
            &self.tools_root,
            &self.temporary_root,
        ]
    }
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory, used as the source root
    cwd: PathBuf,

    /// Merged global and project configuration
    config: Config,
}

impl GlobalContext {
    /// Create a context for the current working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context for a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let global = config::global_config_path();
        let config = config::load_config(global.as_deref(), &config::project_config_path(&cwd));
        GlobalContext { cwd, config }
    }

    /// Replace the loaded configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the workspace layout for a target.
    pub fn layout(&self, target: TargetId) -> WorkspaceLayout {
        match &self.config.paths.build_root {
            Some(build_root) => WorkspaceLayout::with_build_root(&self.cwd, build_root, target),
            None => WorkspaceLayout::new(&self.cwd, target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = WorkspaceLayout::new("/src/anthem", TargetId::new("linux-x86_64"));

        assert_eq!(layout.build_root, PathBuf::from("/src/anthem/build"));
        assert_eq!(
            layout.dependencies_root,
            PathBuf::from("/src/anthem/build/dependencies/linux-x86_64")
        );
        assert_eq!(
            layout.tools_root,
            PathBuf::from("/src/anthem/build/tools/linux-x86_64")
        );
        assert_eq!(
            layout.ledger_path,
            PathBuf::from("/src/anthem/build/versions.json")
        );
        assert_eq!(
            layout.dependency_source_dir(&"glfw".into(), "3.3.2"),
            PathBuf::from("/src/anthem/build/temp/glfw-3.3.2")
        );
        assert_eq!(
            layout.tool_source_dir("ninja", "1.10.0"),
            PathBuf::from("/src/anthem/build/temp/tools/ninja-1.10.0")
        );
        assert_eq!(
            layout.project_build_dir(BuildVariant::Release),
            PathBuf::from("/src/anthem/build/release-linux-x86_64")
        );
    }

    #[test]
    fn test_relative_build_root_override() {
        let layout = WorkspaceLayout::with_build_root(
            "/src/anthem",
            "out",
            TargetId::new("darwin-x86_64"),
        );

        assert_eq!(layout.build_root, PathBuf::from("/src/anthem/out"));
        assert_eq!(layout.temporary_root, PathBuf::from("/src/anthem/out/temp"));
    }

    #[test]
    fn test_context_reads_project_config() {
        let tmp = TempDir::new().unwrap();
        let config_dir = tmp.path().join(".couplet");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            "[paths]\nbuild_root = \"out\"\n",
        )
        .unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let layout = ctx.layout(TargetId::new("linux-x86_64"));
        assert_eq!(layout.build_root, tmp.path().join("out"));
    }
}
