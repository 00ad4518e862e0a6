//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

use couplet::core::options::{BuildVariant, CmakeGenerator, CompilerToolchain};
use couplet::core::target::TargetId;
use couplet::ops::{PresetRunMode, DEFAULT_REPOSITORY};
use couplet::util::shell::ColorChoice;

/// Couplet Composer - builds the Obliging Ode and Unsung Anthem projects
#[derive(Parser)]
#[command(name = "couplet")]
#[command(author, version, about, long_about = None)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Print the commands instead of running them
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Remove the build directory before running
    #[arg(short, long, global = true)]
    pub clean: bool,

    /// Number of parallel build jobs
    #[arg(short, long, global = true, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print debug output; give twice for trace output
    #[arg(long, global = true, action = clap::ArgAction::Count)]
    pub print_debug: u8,

    /// Print nothing but errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// User agent sent to the GitHub API
    #[arg(long, global = true, value_name = "AGENT")]
    pub github_user_agent: Option<String>,

    /// Token for authenticating GitHub API requests
    #[arg(long, global = true, value_name = "TOKEN")]
    pub github_api_token: Option<String>,

    /// Name of the project repository to build
    #[arg(long, global = true, default_value = DEFAULT_REPOSITORY)]
    pub repository: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an invocation stored as a preset
    Preset(PresetArgs),

    /// Set up the dependencies and configure the project
    #[command(args_override_self = true)]
    Configure(ConfigureArgs),

    /// Set up the dependencies, configure and build the project
    #[command(args_override_self = true)]
    Compose(ComposeArgs),

    /// Show which dependencies are up to date
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// The mode a preset runs in.
#[derive(Clone, Copy, ValueEnum)]
pub enum PresetMode {
    Configure,
    Compose,
}

impl From<PresetMode> for PresetRunMode {
    fn from(mode: PresetMode) -> Self {
        match mode {
            PresetMode::Configure => PresetRunMode::Configure,
            PresetMode::Compose => PresetRunMode::Compose,
        }
    }
}

#[derive(Args)]
pub struct PresetArgs {
    /// Mode to run the preset in
    #[arg(value_enum)]
    pub mode: PresetMode,

    /// Preset file to read; may be given more than once
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Name of the preset to use
    #[arg(long)]
    pub name: Option<String>,

    /// List the available presets and exit
    #[arg(long)]
    pub show: bool,

    /// Print the expanded invocation instead of running it
    #[arg(long)]
    pub expand_script_invocation: bool,

    /// Substitutions for the preset, as NAME=VALUE
    #[arg(value_name = "NAME=VALUE")]
    pub substitutions: Vec<String>,
}

/// Options selecting the target and the dependencies.
#[derive(Args, Clone)]
pub struct TargetArgs {
    /// Target to build for; defaults to the host
    #[arg(long, value_name = "TARGET")]
    pub host_target: Option<TargetId>,

    /// Build the tests and their dependencies
    #[arg(short = 't', long = "test")]
    pub build_tests: bool,

    /// OpenGL version the loader is generated for
    #[arg(long, value_name = "VERSION", default_value = "4.6")]
    pub opengl_version: String,
}

#[derive(Args, Clone)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Build variant of the project
    #[arg(long, value_name = "VARIANT")]
    pub build_variant: Option<BuildVariant>,

    /// Build the debug variant
    #[arg(short = 'd', long, conflicts_with_all = ["release_debuginfo", "release", "minsize_release"])]
    pub debug: bool,

    /// Build the release variant with debug info
    #[arg(short = 'r', long, conflicts_with_all = ["release", "minsize_release"])]
    pub release_debuginfo: bool,

    /// Build the release variant
    #[arg(short = 'R', long, conflicts_with = "minsize_release")]
    pub release: bool,

    /// Build the minimum size release variant
    #[arg(short = 'M', long)]
    pub minsize_release: bool,

    /// Compiler family to look for
    #[arg(short = 'C', long, value_name = "TOOLCHAIN")]
    pub compiler_toolchain: Option<CompilerToolchain>,

    /// Use Clang
    #[arg(long, conflicts_with_all = ["gcc", "compiler_toolchain"])]
    pub clang: bool,

    /// Use GCC
    #[arg(long, conflicts_with = "compiler_toolchain")]
    pub gcc: bool,

    /// Version suffix of the compiler executables
    #[arg(long, value_name = "VERSION")]
    pub compiler_version: Option<String>,

    /// Path to the C compiler
    #[arg(long, value_name = "PATH")]
    pub host_cc: Option<PathBuf>,

    /// Path to the C++ compiler
    #[arg(long, value_name = "PATH")]
    pub host_cxx: Option<PathBuf>,

    /// CMake generator
    #[arg(short = 'G', long, value_name = "GENERATOR")]
    pub cmake_generator: Option<CmakeGenerator>,

    /// Generate Ninja build files
    #[arg(short = 'N', long, conflicts_with_all = ["make", "cmake_generator"])]
    pub ninja: bool,

    /// Generate Unix Makefiles
    #[arg(short = 'm', long, conflicts_with = "cmake_generator")]
    pub make: bool,
}

impl ConfigureArgs {
    /// The variant selected by the flags, if any.
    pub fn variant(&self) -> Option<BuildVariant> {
        if self.debug {
            Some(BuildVariant::Debug)
        } else if self.release_debuginfo {
            Some(BuildVariant::RelWithDebInfo)
        } else if self.release {
            Some(BuildVariant::Release)
        } else if self.minsize_release {
            Some(BuildVariant::MinSizeRel)
        } else {
            self.build_variant
        }
    }

    pub fn toolchain(&self) -> Option<CompilerToolchain> {
        if self.clang {
            Some(CompilerToolchain::Clang)
        } else if self.gcc {
            Some(CompilerToolchain::Gcc)
        } else {
            self.compiler_toolchain
        }
    }

    pub fn generator(&self) -> Option<CmakeGenerator> {
        if self.ninja {
            Some(CmakeGenerator::Ninja)
        } else if self.make {
            Some(CmakeGenerator::Make)
        } else {
            self.cmake_generator
        }
    }
}

#[derive(Args)]
pub struct ComposeArgs {
    #[command(flatten)]
    pub build: ConfigureArgs,

    /// Version number of Obliging Ode
    #[arg(long, value_name = "VERSION")]
    pub ode_version: Option<String>,

    /// Version number of Unsung Anthem
    #[arg(long, value_name = "VERSION")]
    pub anthem_version: Option<String>,

    /// Build the libraries of the project
    #[arg(long)]
    pub build_libs: bool,

    /// Window title of Obliging Ode
    #[arg(long, value_name = "NAME")]
    pub ode_window_name: Option<String>,

    /// Window title of Unsung Anthem
    #[arg(long, value_name = "NAME")]
    pub anthem_window_name: Option<String>,

    /// Logger name of Obliging Ode
    #[arg(long, value_name = "NAME")]
    pub ode_logger_name: Option<String>,

    /// Logger name of Unsung Anthem
    #[arg(long, value_name = "NAME")]
    pub anthem_logger_name: Option<String>,

    /// Name of the Obliging Ode binaries
    #[arg(long, value_name = "NAME")]
    pub ode_binaries_name: Option<String>,

    /// Name of the Unsung Anthem binaries
    #[arg(long, value_name = "NAME")]
    pub anthem_binaries_name: Option<String>,

    /// Enable assertions
    #[arg(short = 'a', long, overrides_with = "no_assertions")]
    pub assertions: bool,

    /// Disable assertions
    #[arg(short = 'A', long, overrides_with = "assertions")]
    pub no_assertions: bool,

    /// Build with developer settings
    #[arg(short = 'D', long)]
    pub developer_build: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_variant_shortcuts() {
        let cli = Cli::parse_from(["couplet", "configure", "-R"]);
        let Commands::Configure(args) = cli.command else {
            panic!("expected configure");
        };
        assert_eq!(args.variant(), Some(BuildVariant::Release));
    }

    #[test]
    fn test_repeated_options_override() {
        let cli = Cli::parse_from([
            "couplet",
            "configure",
            "--jobs=4",
            "--build-variant=debug",
            "--jobs",
            "8",
        ]);
        assert_eq!(cli.jobs, Some(8));
    }

    #[test]
    fn test_preset_substitutions() {
        let cli = Cli::parse_from([
            "couplet",
            "preset",
            "compose",
            "--name",
            "release_with_version",
            "version=1.0",
        ]);
        let Commands::Preset(args) = cli.command else {
            panic!("expected preset");
        };
        assert_eq!(args.substitutions, vec!["version=1.0"]);
    }
}
