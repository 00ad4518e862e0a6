//! The tool descriptors of the toolchain.

use std::path::{Path, PathBuf};

use crate::core::options::{CmakeGenerator, CompilerToolchain};
use crate::core::target::{HostSystem, TargetId};
use crate::toolchain::install::{CMakeInstaller, NinjaInstaller};
use crate::toolchain::{ToolDescriptor, ToolInstaller, ToolRole};

/// CMake version installed when the host has none.
pub const CMAKE_VERSION: &str = "3.16.4";

/// Ninja version built when the host has none.
pub const NINJA_VERSION: &str = "1.10.0";

/// Options that select the tools of a run.
#[derive(Debug, Clone, Default)]
pub struct ToolOptions {
    pub compiler_toolchain: CompilerToolchain,
    /// Suffix for versioned compiler names, e.g. `9` for `clang-9`
    pub compiler_version: Option<String>,
    pub generator: CmakeGenerator,
}

/// A C or C++ compiler found on the host.
#[derive(Debug, Clone)]
pub struct CompilerTool {
    role: ToolRole,
    name: String,
}

impl CompilerTool {
    pub fn new(role: ToolRole, name: &str, version: Option<&str>) -> Self {
        let name = match version {
            Some(version) => format!("{}-{}", name, version),
            None => name.to_string(),
        };
        CompilerTool { role, name }
    }
}

impl ToolDescriptor for CompilerTool {
    fn role(&self) -> ToolRole {
        self.role
    }

    fn search_name(&self) -> String {
        self.name.clone()
    }
}

/// CMake, pinned to a version installed from the official binaries.
#[derive(Debug, Clone)]
pub struct CMakeTool {
    version: String,
    installer: CMakeInstaller,
}

impl CMakeTool {
    pub fn new(version: impl Into<String>) -> Self {
        CMakeTool {
            version: version.into(),
            installer: CMakeInstaller,
        }
    }

    /// Path of the CMake executable in a local install.
    pub fn executable(tools_root: &Path, version: &str, host: &HostSystem) -> PathBuf {
        let install = tools_root.join(format!("cmake-{}", version));
        match host {
            HostSystem::Darwin => install
                .join("CMake.app")
                .join("Contents")
                .join("bin")
                .join("cmake"),
            _ => install.join("bin").join(host.exe_name("cmake")),
        }
    }
}

impl ToolDescriptor for CMakeTool {
    fn role(&self) -> ToolRole {
        ToolRole::CMake
    }

    fn search_name(&self) -> String {
        "cmake".to_string()
    }

    fn required_local_version(&self, _target: &TargetId, _host: &HostSystem) -> Option<String> {
        Some(self.version.clone())
    }

    fn local_executable(
        &self,
        tools_root: &Path,
        version: &str,
        _target: &TargetId,
        host: &HostSystem,
    ) -> Option<PathBuf> {
        Some(Self::executable(tools_root, version, host))
    }

    fn installer(&self) -> Option<&dyn ToolInstaller> {
        Some(&self.installer)
    }
}

/// Ninja, pinned to a version built from source.
#[derive(Debug, Clone)]
pub struct NinjaTool {
    version: String,
    installer: NinjaInstaller,
}

impl NinjaTool {
    pub fn new(version: impl Into<String>) -> Self {
        NinjaTool {
            version: version.into(),
            installer: NinjaInstaller,
        }
    }

    /// Path of the Ninja executable in a local install.
    pub fn executable(tools_root: &Path, version: &str, host: &HostSystem) -> PathBuf {
        tools_root
            .join(format!("ninja-{}", version))
            .join("bin")
            .join(host.exe_name("ninja"))
    }
}

impl ToolDescriptor for NinjaTool {
    fn role(&self) -> ToolRole {
        ToolRole::BuildSystemGenerator
    }

    fn search_name(&self) -> String {
        "ninja".to_string()
    }

    fn required_local_version(&self, _target: &TargetId, _host: &HostSystem) -> Option<String> {
        Some(self.version.clone())
    }

    fn local_executable(
        &self,
        tools_root: &Path,
        version: &str,
        _target: &TargetId,
        host: &HostSystem,
    ) -> Option<PathBuf> {
        Some(Self::executable(tools_root, version, host))
    }

    fn installer(&self) -> Option<&dyn ToolInstaller> {
        Some(&self.installer)
    }
}

/// Make, only ever taken from the host.
#[derive(Debug, Clone, Copy)]
pub struct MakeTool;

impl ToolDescriptor for MakeTool {
    fn role(&self) -> ToolRole {
        ToolRole::BuildSystemGenerator
    }

    fn search_name(&self) -> String {
        "make".to_string()
    }
}

/// The descriptors of every tool a run needs.
pub fn default_tools(options: &ToolOptions) -> Vec<Box<dyn ToolDescriptor>> {
    let compilers = options.compiler_toolchain;
    let version = options.compiler_version.as_deref();

    let generator: Box<dyn ToolDescriptor> = match options.generator {
        CmakeGenerator::Ninja => Box::new(NinjaTool::new(NINJA_VERSION)),
        CmakeGenerator::Make => Box::new(MakeTool),
    };

    vec![
        Box::new(CompilerTool::new(
            ToolRole::CCompiler,
            compilers.c_compiler(),
            version,
        )),
        Box::new(CompilerTool::new(
            ToolRole::CxxCompiler,
            compilers.cxx_compiler(),
            version,
        )),
        Box::new(CMakeTool::new(CMAKE_VERSION)),
        generator,
    ]
}
