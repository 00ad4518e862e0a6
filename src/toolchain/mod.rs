//! Toolchain resolution.
//!
//! Every tool the build needs is described by a [`ToolDescriptor`]. The
//! [`ToolchainResolver`] binds each tool role to an executable by trying,
//! in order:
//!
//! 1. an explicit path given on the command line
//! 2. a pinned version installed under the tools root
//! 3. the host system's tool search
//! 4. the tool's installer, if it has one
//!
//! Roles that none of these satisfy are reported as unresolved and the
//! caller decides whether that is fatal.

pub mod install;
pub mod search;
pub mod tools;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::builder::context::BuildContext;
use crate::core::options::CmakeGenerator;
use crate::core::target::{HostSystem, TargetId};
use crate::util::diagnostic::Diagnostic;
use crate::util::shell::Status;

pub use search::{HostSearch, SystemSearch};
pub use tools::{default_tools, ToolOptions};

/// The part a tool plays in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolRole {
    CCompiler,
    CxxCompiler,
    CMake,
    BuildSystemGenerator,
}

impl ToolRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolRole::CCompiler => "C compiler",
            ToolRole::CxxCompiler => "C++ compiler",
            ToolRole::CMake => "CMake",
            ToolRole::BuildSystemGenerator => "build system",
        }
    }
}

impl fmt::Display for ToolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behavior bundle for one tool.
pub trait ToolDescriptor: Send + Sync {
    fn role(&self) -> ToolRole;

    /// Executable name used for the host system search.
    fn search_name(&self) -> String;

    /// Version that must be installed under the tools root, if the tool is
    /// pinned.
    fn required_local_version(&self, _target: &TargetId, _host: &HostSystem) -> Option<String> {
        None
    }

    /// Path of the executable of a local install of `version`.
    ///
    /// Tools without a local install layout can only be found on the host.
    fn local_executable(
        &self,
        _tools_root: &Path,
        _version: &str,
        _target: &TargetId,
        _host: &HostSystem,
    ) -> Option<PathBuf> {
        None
    }

    /// Procedure that installs the tool under the tools root.
    fn installer(&self) -> Option<&dyn ToolInstaller> {
        None
    }
}

/// Installs a tool from source or a prebuilt archive.
pub trait ToolInstaller: Send + Sync {
    /// Install `version` and return the path of its executable.
    ///
    /// `ctx` carries the toolchain resolved so far.
    fn install(&self, version: &str, ctx: &BuildContext) -> Result<PathBuf>;
}

/// How a tool was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOrigin {
    /// Given on the command line
    Explicit,
    /// Pinned install under the tools root
    Local,
    /// Found by the host system search
    Host,
    /// Installed during this run
    Installed,
}

impl fmt::Display for ToolOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolOrigin::Explicit => "explicit",
            ToolOrigin::Local => "local",
            ToolOrigin::Host => "host",
            ToolOrigin::Installed => "installed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    pub path: PathBuf,
    pub origin: ToolOrigin,
}

/// The tools bound for a run, plus the roles nothing could satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToolchain {
    tools: BTreeMap<ToolRole, ResolvedTool>,
    generator: CmakeGenerator,
    unresolved: Vec<ToolRole>,
}

impl ResolvedToolchain {
    pub fn new(generator: CmakeGenerator) -> Self {
        ResolvedToolchain {
            tools: BTreeMap::new(),
            generator,
            unresolved: Vec::new(),
        }
    }

    /// Bind a role, clearing it from the unresolved list.
    pub fn bind(&mut self, role: ToolRole, path: PathBuf, origin: ToolOrigin) {
        tracing::debug!("using {} {} ({})", role, path.display(), origin);
        self.unresolved.retain(|r| *r != role);
        self.tools.insert(role, ResolvedTool { path, origin });
    }

    fn mark_unresolved(&mut self, role: ToolRole) {
        if !self.unresolved.contains(&role) {
            self.unresolved.push(role);
        }
    }

    pub fn get(&self, role: ToolRole) -> Option<&Path> {
        self.tools.get(&role).map(|t| t.path.as_path())
    }

    pub fn tool(&self, role: ToolRole) -> Option<&ResolvedTool> {
        self.tools.get(&role)
    }

    /// Get a bound tool or fail with an unresolved-tool error.
    pub fn require(&self, role: ToolRole) -> Result<&Path, ToolchainError> {
        self.get(role).ok_or_else(|| ToolchainError::Unresolved {
            roles: vec![role],
            generator: self.generator,
        })
    }

    /// The generator CMake writes build files for.
    pub fn generator(&self) -> CmakeGenerator {
        self.generator
    }

    pub fn unresolved(&self) -> &[ToolRole] {
        &self.unresolved
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Fail if any role is unresolved.
    pub fn ensure_complete(&self) -> Result<(), ToolchainError> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(ToolchainError::Unresolved {
                roles: self.unresolved.clone(),
                generator: self.generator,
            })
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ToolRole, &ResolvedTool)> {
        self.tools.iter().map(|(role, tool)| (*role, tool))
    }
}

/// Error raised when the toolchain is incomplete.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ToolchainError {
    #[error("could not find the {}", join_roles(roles))]
    #[diagnostic(code(couplet::toolchain::unresolved))]
    Unresolved {
        roles: Vec<ToolRole>,
        generator: CmakeGenerator,
    },
}

fn join_roles(roles: &[ToolRole]) -> String {
    roles
        .iter()
        .map(ToolRole::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ToolchainError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ToolchainError::Unresolved { roles, generator } => {
                let mut diag = Diagnostic::error(self.to_string());
                for role in roles {
                    diag = diag.with_context(format!("no usable {} was found", role));
                }
                if roles
                    .iter()
                    .any(|r| matches!(r, ToolRole::CCompiler | ToolRole::CxxCompiler))
                {
                    diag = diag.with_suggestion(
                        "Install the compilers or point `--host-cc` and `--host-cxx` to them",
                    );
                }
                if roles.contains(&ToolRole::BuildSystemGenerator)
                    && *generator != CmakeGenerator::Make
                {
                    diag = diag.with_suggestion("Use Make instead with `--cmake-generator make`");
                }
                diag
            }
        }
    }
}

/// Resolves tool descriptors into a toolchain.
pub struct ToolchainResolver<'a> {
    target: &'a TargetId,
    host: &'a HostSystem,
    tools_root: &'a Path,
    search: &'a dyn HostSearch,
    overrides: BTreeMap<ToolRole, PathBuf>,
}

impl<'a> ToolchainResolver<'a> {
    pub fn new(
        target: &'a TargetId,
        host: &'a HostSystem,
        tools_root: &'a Path,
        search: &'a dyn HostSearch,
    ) -> Self {
        ToolchainResolver {
            target,
            host,
            tools_root,
            search,
            overrides: BTreeMap::new(),
        }
    }

    /// Bind a role to an explicit path, so the host is never searched for it.
    pub fn with_override(mut self, role: ToolRole, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(role, path.into());
        self
    }

    /// Look for a pinned local install of `tool`.
    fn find_local(&self, tool: &dyn ToolDescriptor) -> Option<PathBuf> {
        let version = tool.required_local_version(self.target, self.host)?;
        let path = tool.local_executable(self.tools_root, &version, self.target, self.host)?;
        if path.exists() {
            Some(path)
        } else {
            tracing::trace!("{} {} isn't installed at {}", tool.role(), version, path.display());
            None
        }
    }

    /// Bind every tool without installing anything.
    pub fn resolve(
        &self,
        tools: &[Box<dyn ToolDescriptor>],
        generator: CmakeGenerator,
    ) -> ResolvedToolchain {
        let mut toolchain = ResolvedToolchain::new(generator);

        let mut missing_locally = Vec::new();
        for tool in tools {
            let role = tool.role();
            if let Some(path) = self.overrides.get(&role) {
                toolchain.bind(role, path.clone(), ToolOrigin::Explicit);
            } else if let Some(path) = self.find_local(tool.as_ref()) {
                toolchain.bind(role, path, ToolOrigin::Local);
            } else {
                missing_locally.push(tool);
            }
        }

        for tool in missing_locally {
            let name = tool.search_name();
            match self.search.find(&name, self.host) {
                Some(path) => toolchain.bind(tool.role(), path, ToolOrigin::Host),
                None => {
                    tracing::debug!("{} `{}` wasn't found on the host", tool.role(), name);
                    toolchain.mark_unresolved(tool.role());
                }
            }
        }

        toolchain
    }

    /// Install the unresolved tools that have installers.
    ///
    /// Tools are installed in role order, so an installer sees every tool
    /// bound before it (the build system installer can use CMake).
    pub fn install_missing(
        &self,
        toolchain: &mut ResolvedToolchain,
        tools: &[Box<dyn ToolDescriptor>],
        ctx: &BuildContext,
    ) -> Result<()> {
        let mut pending: Vec<&dyn ToolDescriptor> = tools
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| toolchain.unresolved().contains(&t.role()))
            .collect();
        pending.sort_by_key(|t| t.role());

        for tool in pending {
            let (Some(installer), Some(version)) = (
                tool.installer(),
                tool.required_local_version(self.target, self.host),
            ) else {
                continue;
            };

            ctx.shell
                .status(Status::Installing, format!("{} {}", tool.search_name(), version));
            let ctx = ctx.with_toolchain(toolchain.clone());
            let path = installer.install(&version, &ctx)?;
            toolchain.bind(tool.role(), path, ToolOrigin::Installed);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context, FakeSearch, StaticTool};
    use tempfile::TempDir;

    fn target() -> TargetId {
        TargetId::new("linux-x86_64")
    }

    #[test]
    fn test_local_install_wins_over_host() {
        let tmp = TempDir::new().unwrap();
        let local = tmp.path().join("cmake-3.16.4").join("bin").join("cmake");
        std::fs::create_dir_all(local.parent().unwrap()).unwrap();
        std::fs::write(&local, "").unwrap();

        let tools: Vec<Box<dyn ToolDescriptor>> =
            vec![Box::new(StaticTool::new(ToolRole::CMake, "cmake").pinned("3.16.4"))];
        let search = FakeSearch::new().with("cmake", "/usr/bin/cmake");
        let host = HostSystem::Linux;
        let target = target();

        let resolver = ToolchainResolver::new(&target, &host, tmp.path(), &search);
        let toolchain = resolver.resolve(&tools, CmakeGenerator::Ninja);

        assert_eq!(toolchain.get(ToolRole::CMake), Some(local.as_path()));
        assert_eq!(
            toolchain.tool(ToolRole::CMake).map(|t| t.origin),
            Some(ToolOrigin::Local)
        );
        assert!(search.queries().is_empty());
    }

    #[test]
    fn test_missing_local_install_falls_back_to_host() {
        let tmp = TempDir::new().unwrap();
        let tools: Vec<Box<dyn ToolDescriptor>> = vec![
            Box::new(StaticTool::new(ToolRole::CMake, "cmake").pinned("3.16.4")),
            Box::new(StaticTool::new(ToolRole::CCompiler, "clang")),
        ];
        let search = FakeSearch::new()
            .with("cmake", "/usr/bin/cmake")
            .with("clang", "/usr/bin/clang");
        let host = HostSystem::Linux;
        let target = target();

        let toolchain = ToolchainResolver::new(&target, &host, tmp.path(), &search)
            .resolve(&tools, CmakeGenerator::Ninja);

        assert_eq!(toolchain.get(ToolRole::CMake), Some(Path::new("/usr/bin/cmake")));
        assert_eq!(toolchain.get(ToolRole::CCompiler), Some(Path::new("/usr/bin/clang")));
        assert!(toolchain.is_complete());
    }

    #[test]
    fn test_unresolved_roles_are_reported() {
        let tmp = TempDir::new().unwrap();
        let tools: Vec<Box<dyn ToolDescriptor>> = vec![
            Box::new(StaticTool::new(ToolRole::CCompiler, "clang")),
            Box::new(StaticTool::new(ToolRole::BuildSystemGenerator, "ninja")),
        ];
        let search = FakeSearch::new().with("clang", "/usr/bin/clang");
        let host = HostSystem::Linux;
        let target = target();

        let toolchain = ToolchainResolver::new(&target, &host, tmp.path(), &search)
            .resolve(&tools, CmakeGenerator::Ninja);

        assert_eq!(toolchain.unresolved(), &[ToolRole::BuildSystemGenerator]);
        let err = toolchain.ensure_complete().unwrap_err();
        assert_eq!(err.to_string(), "could not find the build system");
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("--cmake-generator make"));
    }

    #[test]
    fn test_explicit_override_skips_search() {
        let tmp = TempDir::new().unwrap();
        let tools: Vec<Box<dyn ToolDescriptor>> =
            vec![Box::new(StaticTool::new(ToolRole::CCompiler, "clang"))];
        let search = FakeSearch::new();
        let host = HostSystem::Linux;
        let target = target();

        let toolchain = ToolchainResolver::new(&target, &host, tmp.path(), &search)
            .with_override(ToolRole::CCompiler, "/opt/llvm/bin/clang")
            .resolve(&tools, CmakeGenerator::Ninja);

        assert_eq!(
            toolchain.get(ToolRole::CCompiler),
            Some(Path::new("/opt/llvm/bin/clang"))
        );
        assert!(search.queries().is_empty());
    }

    #[test]
    fn test_install_missing_binds_installed_tool() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_context(tmp.path(), "linux-x86_64");
        let installed = ctx.layout.tools_root.join("cmake-3.16.4").join("bin").join("cmake");
        let tools: Vec<Box<dyn ToolDescriptor>> = vec![Box::new(
            StaticTool::new(ToolRole::CMake, "cmake")
                .pinned("3.16.4")
                .installs_to(installed.clone()),
        )];
        let search = FakeSearch::new();
        let host = HostSystem::Linux;
        let target = target();

        let resolver =
            ToolchainResolver::new(&target, &host, &ctx.layout.tools_root, &search);
        let mut toolchain = resolver.resolve(&tools, CmakeGenerator::Ninja);
        assert_eq!(toolchain.unresolved(), &[ToolRole::CMake]);

        resolver.install_missing(&mut toolchain, &tools, &ctx).unwrap();

        assert!(toolchain.is_complete());
        assert_eq!(toolchain.get(ToolRole::CMake), Some(installed.as_path()));
        assert_eq!(
            toolchain.tool(ToolRole::CMake).map(|t| t.origin),
            Some(ToolOrigin::Installed)
        );
    }
}
