//! Build context.
//!
//! The immutable value threaded through the dependency pass, the tool
//! installers and the project build. It carries the target identity, the
//! workspace layout, the resolved toolchain and the collaborators used to
//! touch the outside world.

use std::sync::Arc;

use crate::core::options::{BuildVariant, CmakeGenerator};
use crate::core::target::{HostSystem, TargetId};
use crate::sources::{GitHubAuth, SourceFetcher};
use crate::toolchain::ResolvedToolchain;
use crate::util::context::WorkspaceLayout;
use crate::util::fs::FileSystem;
use crate::util::process::Runner;
use crate::util::shell::Shell;

/// Everything a build step needs.
#[derive(Clone)]
pub struct BuildContext {
    /// Target being built
    pub target: TargetId,

    /// System the invocation runs on
    pub host: HostSystem,

    /// Workspace directories
    pub layout: WorkspaceLayout,

    /// Tools bound for this run
    pub toolchain: ResolvedToolchain,

    /// CMake build type of the project
    pub variant: BuildVariant,

    /// Parallel job count passed to the native build system
    pub jobs: usize,

    /// GitHub API credentials
    pub auth: GitHubAuth,

    pub runner: Runner,
    pub fs: FileSystem,
    pub shell: Arc<Shell>,
    pub fetcher: Arc<dyn SourceFetcher>,
}

impl BuildContext {
    /// Copy of the context with a different toolchain.
    pub fn with_toolchain(&self, toolchain: ResolvedToolchain) -> Self {
        BuildContext {
            toolchain,
            ..self.clone()
        }
    }

    pub fn generator(&self) -> CmakeGenerator {
        self.toolchain.generator()
    }

    pub fn is_dry_run(&self) -> bool {
        self.runner.is_dry_run()
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("target", &self.target)
            .field("host", &self.host)
            .field("layout", &self.layout)
            .field("toolchain", &self.toolchain)
            .field("variant", &self.variant)
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}
