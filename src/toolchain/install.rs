//! Tool installers.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::builder::cmake::CMakeBuilder;
use crate::builder::context::BuildContext;
use crate::core::options::CmakeGenerator;
use crate::core::target::HostSystem;
use crate::sources::{GitHubRepo, SourceSpec};
use crate::toolchain::tools::{CMakeTool, NinjaTool};
use crate::toolchain::ToolInstaller;

/// Installs CMake from the official release binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct CMakeInstaller;

impl CMakeInstaller {
    /// Name of the release archive for a host.
    pub fn asset_name(version: &str, host: &HostSystem) -> Result<String> {
        let platform = match host {
            HostSystem::Linux => "Linux-x86_64",
            HostSystem::Darwin => "Darwin-x86_64",
            other => bail!("no prebuilt CMake archive is available for {}", other),
        };
        Ok(format!("cmake-{}-{}.tar.gz", version, platform))
    }
}

impl ToolInstaller for CMakeInstaller {
    fn install(&self, version: &str, ctx: &BuildContext) -> Result<PathBuf> {
        let dest = ctx.layout.tools_root.join(format!("cmake-{}", version));
        let spec = SourceSpec::ReleaseAsset {
            repo: GitHubRepo::new("Kitware", "CMake"),
            tag: format!("v{}", version),
            asset: Self::asset_name(version, &ctx.host)?,
            sha256: None,
        };

        ctx.fs.remove_tree(&dest)?;
        ctx.fetcher
            .fetch(&spec, &dest, &ctx.auth)
            .with_context(|| format!("failed to download CMake {}", version))?;

        Ok(CMakeTool::executable(
            &ctx.layout.tools_root,
            version,
            &ctx.host,
        ))
    }
}

/// Builds Ninja from a tagged source checkout with CMake and Make.
#[derive(Debug, Clone, Copy, Default)]
pub struct NinjaInstaller;

impl ToolInstaller for NinjaInstaller {
    fn install(&self, version: &str, ctx: &BuildContext) -> Result<PathBuf> {
        let source_dir = ctx.layout.tool_source_dir("ninja", version);
        let build_dir = ctx.layout.temporary_root.join("build").join("ninja");
        ctx.fs.remove_tree(&build_dir)?;

        if !source_dir.exists() {
            let spec = SourceSpec::git_tag(GitHubRepo::new("ninja-build", "ninja"), format!("v{}", version));
            ctx.fetcher
                .fetch(&spec, &source_dir, &ctx.auth)
                .with_context(|| format!("failed to fetch Ninja {}", version))?;
        }

        let builder = CMakeBuilder::new(ctx, &source_dir, &build_dir)
            .generator(CmakeGenerator::Make)
            .build_type("Release");
        builder.configure()?;
        builder.build()?;

        let exe_name = ctx.host.exe_name("ninja");
        let executable = NinjaTool::executable(&ctx.layout.tools_root, version, &ctx.host);
        let bin_dir = executable
            .parent()
            .with_context(|| format!("{} has no parent directory", executable.display()))?;
        ctx.fs.makedirs(bin_dir)?;
        ctx.fs.copy(&build_dir.join(&exe_name), &executable)?;

        Ok(executable)
    }
}
