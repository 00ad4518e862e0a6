//! Build options shared by the configure and compose modes.

use std::fmt;
use std::str::FromStr;

/// The CMake build variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildVariant {
    #[default]
    Debug,
    RelWithDebInfo,
    Release,
    MinSizeRel,
}

impl BuildVariant {
    /// Value passed as `CMAKE_BUILD_TYPE`.
    pub fn cmake_build_type(&self) -> &'static str {
        match self {
            BuildVariant::Debug => "Debug",
            BuildVariant::RelWithDebInfo => "RelWithDebInfo",
            BuildVariant::Release => "Release",
            BuildVariant::MinSizeRel => "MinSizeRel",
        }
    }

    /// Name used in build directory names.
    pub fn dir_name(&self) -> &'static str {
        match self {
            BuildVariant::Debug => "debug",
            BuildVariant::RelWithDebInfo => "relwithdebinfo",
            BuildVariant::Release => "release",
            BuildVariant::MinSizeRel => "minsizerel",
        }
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cmake_build_type())
    }
}

impl FromStr for BuildVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(BuildVariant::Debug),
            "relwithdebinfo" | "release-debuginfo" => Ok(BuildVariant::RelWithDebInfo),
            "release" => Ok(BuildVariant::Release),
            "minsizerel" | "minsize-release" => Ok(BuildVariant::MinSizeRel),
            _ => Err(format!(
                "invalid build variant '{}'; expected 'Debug', 'RelWithDebInfo', 'Release', or 'MinSizeRel'",
                s
            )),
        }
    }
}

/// The generator CMake writes build files for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CmakeGenerator {
    #[default]
    Ninja,
    Make,
}

impl CmakeGenerator {
    /// Generator name passed to `cmake -G`.
    pub fn cmake_name(&self) -> &'static str {
        match self {
            CmakeGenerator::Ninja => "Ninja",
            CmakeGenerator::Make => "Unix Makefiles",
        }
    }

    /// Name of the build-system executable the generator needs.
    pub fn build_tool(&self) -> &'static str {
        match self {
            CmakeGenerator::Ninja => "ninja",
            CmakeGenerator::Make => "make",
        }
    }
}

impl fmt::Display for CmakeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cmake_name())
    }
}

impl FromStr for CmakeGenerator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ninja" => Ok(CmakeGenerator::Ninja),
            "make" | "unix makefiles" => Ok(CmakeGenerator::Make),
            _ => Err(format!(
                "invalid CMake generator '{}'; expected 'ninja' or 'make'",
                s
            )),
        }
    }
}

/// The compiler family resolved when no explicit compiler paths are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompilerToolchain {
    #[default]
    Clang,
    Gcc,
}

impl CompilerToolchain {
    /// Name of the C compiler executable.
    pub fn c_compiler(&self) -> &'static str {
        match self {
            CompilerToolchain::Clang => "clang",
            CompilerToolchain::Gcc => "gcc",
        }
    }

    /// Name of the C++ compiler executable.
    pub fn cxx_compiler(&self) -> &'static str {
        match self {
            CompilerToolchain::Clang => "clang++",
            CompilerToolchain::Gcc => "g++",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.c_compiler()
    }
}

impl fmt::Display for CompilerToolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompilerToolchain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clang" => Ok(CompilerToolchain::Clang),
            "gcc" => Ok(CompilerToolchain::Gcc),
            _ => Err(format!(
                "invalid compiler toolchain '{}'; expected 'clang' or 'gcc'",
                s
            )),
        }
    }
}
