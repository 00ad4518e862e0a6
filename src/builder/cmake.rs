//! CMake adapter.
//!
//! Drives the configure, build and install steps of a CMake project with
//! the resolved toolchain. Used for CMake dependencies, tools built from
//! source and the project itself.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::context::BuildContext;
use crate::core::options::CmakeGenerator;
use crate::toolchain::ToolRole;
use crate::util::process::ProcessBuilder;

/// CMake build adapter.
pub struct CMakeBuilder<'a> {
    ctx: &'a BuildContext,
    source_dir: PathBuf,
    build_dir: PathBuf,
    generator: CmakeGenerator,
    build_type: String,
    install_prefix: Option<PathBuf>,
    definitions: Vec<(String, String)>,
}

impl<'a> CMakeBuilder<'a> {
    /// Create a builder with the context's generator and build variant.
    pub fn new(ctx: &'a BuildContext, source_dir: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        CMakeBuilder {
            ctx,
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            generator: ctx.generator(),
            build_type: ctx.variant.cmake_build_type().to_string(),
            install_prefix: None,
            definitions: Vec::new(),
        }
    }

    /// Use a different generator than the context's.
    pub fn generator(mut self, generator: CmakeGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn build_type(mut self, build_type: impl Into<String>) -> Self {
        self.build_type = build_type.into();
        self
    }

    pub fn install_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.install_prefix = Some(prefix.into());
        self
    }

    /// Add a `-D<name>=<value>` cache entry.
    pub fn define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.definitions.push((name.into(), value.into()));
        self
    }

    pub fn defines<I, K, V>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.definitions
            .extend(definitions.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    fn cmake(&self) -> Result<&Path> {
        Ok(self.ctx.toolchain.require(ToolRole::CMake)?)
    }

    /// The `cmake` configure command.
    pub fn configure_command(&self) -> Result<ProcessBuilder> {
        let toolchain = &self.ctx.toolchain;
        let mut cmd = ProcessBuilder::new(self.cmake()?)
            .arg("-S")
            .arg(&self.source_dir)
            .arg("-B")
            .arg(&self.build_dir)
            .arg("-G")
            .arg(self.generator.cmake_name())
            .arg(format!("-DCMAKE_BUILD_TYPE={}", self.build_type));

        if let Some(cc) = toolchain.get(ToolRole::CCompiler) {
            cmd = cmd.arg(format!("-DCMAKE_C_COMPILER={}", cc.display()));
        }
        if let Some(cxx) = toolchain.get(ToolRole::CxxCompiler) {
            cmd = cmd.arg(format!("-DCMAKE_CXX_COMPILER={}", cxx.display()));
        }
        if self.generator == toolchain.generator() {
            if let Some(program) = toolchain.get(ToolRole::BuildSystemGenerator) {
                cmd = cmd.arg(format!("-DCMAKE_MAKE_PROGRAM={}", program.display()));
            }
        }

        if let Some(prefix) = &self.install_prefix {
            cmd = cmd.arg(format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display()));
        }
        cmd = cmd.arg(format!(
            "-DCMAKE_PREFIX_PATH={}",
            self.ctx.layout.dependencies_root.display()
        ));

        for (name, value) in &self.definitions {
            cmd = cmd.arg(format!("-D{}={}", name, value));
        }

        Ok(cmd)
    }

    /// The `cmake --build` command.
    pub fn build_command(&self, target: Option<&str>) -> Result<ProcessBuilder> {
        let mut cmd = ProcessBuilder::new(self.cmake()?)
            .arg("--build")
            .arg(&self.build_dir)
            .arg("--parallel")
            .arg(self.ctx.jobs.to_string())
            .arg("--config")
            .arg(&self.build_type);

        if let Some(target) = target {
            cmd = cmd.arg("--target").arg(target);
        }
        Ok(cmd)
    }

    /// Run CMake configuration.
    pub fn configure(&self) -> Result<()> {
        tracing::debug!("configuring {}", self.source_dir.display());
        self.ctx.fs.makedirs(&self.build_dir)?;
        self.ctx.runner.run(&self.configure_command()?)
    }

    /// Run the native build.
    pub fn build(&self) -> Result<()> {
        tracing::debug!("building {}", self.build_dir.display());
        self.ctx.runner.run(&self.build_command(None)?)
    }

    /// Build the `install` target.
    pub fn install(&self) -> Result<()> {
        self.ctx.runner.run(&self.build_command(Some("install"))?)
    }

    /// Configure, build and install.
    pub fn configure_build_install(&self) -> Result<()> {
        self.configure()?;
        self.build()?;
        self.install()
    }
}
