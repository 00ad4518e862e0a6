//! Fixtures for common test scenarios.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::builder::context::BuildContext;
use crate::core::options::{BuildVariant, CmakeGenerator};
use crate::core::target::{HostSystem, TargetId};
use crate::sources::{GitHubAuth, SourceFetcher, SourceSpec};
use crate::toolchain::{ResolvedToolchain, ToolOrigin, ToolRole};
use crate::util::context::WorkspaceLayout;
use crate::util::fs::FileSystem;
use crate::util::process::Runner;
use crate::util::shell::Shell;

/// Fetcher that records the requested sources and creates nothing.
#[derive(Debug, Default)]
pub struct NoopFetcher {
    fetched: Mutex<Vec<(SourceSpec, PathBuf)>>,
}

impl NoopFetcher {
    pub fn fetched(&self) -> Vec<(SourceSpec, PathBuf)> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl SourceFetcher for NoopFetcher {
    fn fetch(&self, spec: &SourceSpec, dest: &Path, _auth: &GitHubAuth) -> Result<PathBuf> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push((spec.clone(), dest.to_path_buf()));
        }
        Ok(dest.to_path_buf())
    }
}

/// Fetcher that creates the source tree, with a `SOURCE` file naming the
/// spec it was fetched from.
#[derive(Debug, Default)]
pub struct CheckoutFetcher {
    inner: NoopFetcher,
}

impl CheckoutFetcher {
    pub fn fetched(&self) -> Vec<(SourceSpec, PathBuf)> {
        self.inner.fetched()
    }
}

impl SourceFetcher for CheckoutFetcher {
    fn fetch(&self, spec: &SourceSpec, dest: &Path, auth: &GitHubAuth) -> Result<PathBuf> {
        std::fs::create_dir_all(dest)?;
        std::fs::write(dest.join("SOURCE"), spec.to_string())?;
        self.inner.fetch(spec, dest, auth)
    }
}

/// The toolchain every test context is bound to.
pub fn test_toolchain() -> ResolvedToolchain {
    let mut toolchain = ResolvedToolchain::new(CmakeGenerator::Ninja);
    for (role, path) in [
        (ToolRole::CCompiler, "/usr/bin/clang"),
        (ToolRole::CxxCompiler, "/usr/bin/clang++"),
        (ToolRole::CMake, "/usr/bin/cmake"),
        (ToolRole::BuildSystemGenerator, "/usr/bin/ninja"),
    ] {
        toolchain.bind(role, PathBuf::from(path), ToolOrigin::Host);
    }
    toolchain
}

/// A build context rooted at `root` for `target`.
///
/// Commands only go to the runner's history; file-system changes are real
/// and stay under `root`.
pub fn test_context(root: &Path, target: &str) -> BuildContext {
    test_context_with_fetcher(root, target, Arc::new(NoopFetcher::default()))
}

pub fn test_context_with_fetcher(
    root: &Path,
    target: &str,
    fetcher: Arc<dyn SourceFetcher>,
) -> BuildContext {
    let target = TargetId::new(target);
    BuildContext {
        layout: WorkspaceLayout::new(root, target.clone()),
        target,
        host: HostSystem::Linux,
        toolchain: test_toolchain(),
        variant: BuildVariant::Debug,
        jobs: 2,
        auth: GitHubAuth::default(),
        runner: Runner::new(true, false),
        fs: FileSystem::new(false),
        shell: Arc::new(Shell::quiet()),
        fetcher,
    }
}

/// A preset file exercising mixins and substitutions.
pub const PRESET_FILE: &str = r#"
# Presets used by the tests.

[preset: mixin_common]
dry-run
jobs=4

[preset: Debug]
mixin-preset=mixin_common
build-variant=debug

[preset: release_with_version]
mixin-preset=
    mixin_common
build-variant=release
anthem-version=%(version)s

[preset: alpha]
clean
"#;
