//! Configure and compose invocations.
//!
//! Wires the workspace set-up, the project checkout, the toolchain and the
//! dependency pass together, then hands the project to CMake.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::builder::cmake::CMakeBuilder;
use crate::builder::context::BuildContext;
use crate::core::options::{BuildVariant, CmakeGenerator, CompilerToolchain};
use crate::core::target::{HostSystem, TargetId};
use crate::deps::{default_registry, JsonLedgerFile, RegistryOptions};
use crate::ops::bootstrap::bootstrap;
use crate::ops::clone::clone_project;
use crate::ops::set_up::set_up;
use crate::sources::{GitHubAuth, GitHubFetcher, SourceFetcher};
use crate::toolchain::{
    default_tools, HostSearch, ResolvedToolchain, SystemSearch, ToolOptions, ToolRole,
    ToolchainResolver,
};
use crate::util::context::GlobalContext;
use crate::util::fs::FileSystem;
use crate::util::process::Runner;
use crate::util::shell::{Shell, Status};

/// Feature options of a compose invocation, passed to the project as CMake
/// cache entries.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub ode_version: Option<String>,
    pub anthem_version: Option<String>,
    pub ode_window_name: Option<String>,
    pub anthem_window_name: Option<String>,
    pub ode_logger_name: Option<String>,
    pub anthem_logger_name: Option<String>,
    pub ode_binaries_name: Option<String>,
    pub anthem_binaries_name: Option<String>,
    pub assertions: bool,
    pub developer_build: bool,
    pub build_libs: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        ComposeOptions {
            ode_version: None,
            anthem_version: None,
            ode_window_name: None,
            anthem_window_name: None,
            ode_logger_name: None,
            anthem_logger_name: None,
            ode_binaries_name: None,
            anthem_binaries_name: None,
            assertions: true,
            developer_build: false,
            build_libs: false,
        }
    }
}

impl ComposeOptions {
    /// The CMake cache entries of these options.
    pub fn cache_entries(&self) -> Vec<(String, String)> {
        let on_off = |flag: bool| if flag { "ON" } else { "OFF" }.to_string();

        let mut entries: Vec<(String, String)> = [
            ("ODE_VERSION", &self.ode_version),
            ("ANTHEM_VERSION", &self.anthem_version),
            ("ODE_WINDOW_NAME", &self.ode_window_name),
            ("ANTHEM_WINDOW_NAME", &self.anthem_window_name),
            ("ODE_LOGGER_NAME", &self.ode_logger_name),
            ("ANTHEM_LOGGER_NAME", &self.anthem_logger_name),
            ("ODE_BINARIES_NAME", &self.ode_binaries_name),
            ("ANTHEM_BINARIES_NAME", &self.anthem_binaries_name),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| (name.to_string(), v.clone())))
        .collect();

        entries.push(("ANTHEM_ASSERTIONS".to_string(), on_off(self.assertions)));
        entries.push((
            "ANTHEM_DEVELOPER_BUILD".to_string(),
            on_off(self.developer_build),
        ));
        entries.push(("ANTHEM_BUILD_LIBS".to_string(), on_off(self.build_libs)));
        entries
    }
}

/// What an invocation does after the dependency pass.
#[derive(Debug, Clone)]
pub enum RunMode {
    /// Configure the project with CMake.
    Configure,
    /// Configure and build the project.
    Compose(ComposeOptions),
}

/// Options shared by configure and compose.
#[derive(Debug, Clone)]
pub struct InvocationOptions {
    pub mode: RunMode,
    pub dry_run: bool,
    pub clean: bool,
    pub jobs: usize,
    pub print_debug: u8,
    pub target: TargetId,
    pub host: HostSystem,
    pub variant: BuildVariant,
    pub generator: CmakeGenerator,
    pub compiler_toolchain: CompilerToolchain,
    pub compiler_version: Option<String>,
    pub host_cc: Option<PathBuf>,
    pub host_cxx: Option<PathBuf>,
    pub repository: String,
    pub build_tests: bool,
    pub opengl_version: String,
    pub auth: GitHubAuth,
}

impl InvocationOptions {
    fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            opengl_version: self.opengl_version.clone(),
            build_tests: self.build_tests,
        }
    }

    fn tool_options(&self) -> ToolOptions {
        ToolOptions {
            compiler_toolchain: self.compiler_toolchain,
            compiler_version: self.compiler_version.clone(),
            generator: self.generator,
        }
    }
}

/// Run a configure or compose invocation.
pub fn invoke(gctx: &GlobalContext, options: &InvocationOptions, shell: Arc<Shell>) -> Result<()> {
    let fetcher: Arc<dyn SourceFetcher> =
        Arc::new(GitHubFetcher::new(options.dry_run, Arc::clone(&shell)));
    invoke_with(gctx, options, shell, fetcher, &SystemSearch)
}

/// Run an invocation with explicit fetch and tool search collaborators.
pub fn invoke_with(
    gctx: &GlobalContext,
    options: &InvocationOptions,
    shell: Arc<Shell>,
    fetcher: Arc<dyn SourceFetcher>,
    search: &dyn HostSearch,
) -> Result<()> {
    let (status, verb) = match options.mode {
        RunMode::Configure => (Status::Configuring, "configured"),
        RunMode::Compose(_) => (Status::Composing, "composed"),
    };
    let span = shell.span(
        status,
        format!("{} for {} ({})", options.repository, options.target, options.variant),
    );

    let layout = gctx.layout(options.target.clone());
    let fs = FileSystem::new(options.dry_run);
    set_up(&layout, &fs, options.clean, &shell)?;

    let mut ctx = BuildContext {
        target: options.target.clone(),
        host: options.host.clone(),
        layout,
        toolchain: ResolvedToolchain::new(options.generator),
        variant: options.variant,
        jobs: options.jobs,
        auth: options.auth.clone(),
        runner: Runner::new(options.dry_run, options.print_debug > 0),
        fs,
        shell: Arc::clone(&shell),
        fetcher,
    };

    let project_dir = clone_project(&ctx, &options.repository)?;

    ctx.toolchain = resolve_toolchain(&ctx, options, search)?;

    let registry = default_registry(&options.registry_options())?;
    let mut store = JsonLedgerFile::new(&ctx.layout.ledger_path).dry_run(options.dry_run);
    bootstrap(&registry, &ctx, &mut store)?;

    let build_dir = ctx.layout.project_build_dir(options.variant);
    let mut project = CMakeBuilder::new(&ctx, &project_dir, &build_dir)
        .define("ANTHEM_TEST", if options.build_tests { "ON" } else { "OFF" })
        .define("OPENGL_VERSION", options.opengl_version.as_str());
    if let RunMode::Compose(compose) = &options.mode {
        project = project.defines(compose.cache_entries());
    }

    project
        .configure()
        .with_context(|| format!("failed to configure {}", options.repository))?;
    if let RunMode::Compose(_) = options.mode {
        shell.status(Status::Building, &options.repository);
        project
            .build()
            .with_context(|| format!("failed to build {}", options.repository))?;
    }

    span.finish_with_message(format!("{} {}", verb, options.repository));
    Ok(())
}

/// Resolve the toolchain, installing the pinned tools that are missing.
///
/// Missing compilers or CMake are fatal, and so is a missing build system.
fn resolve_toolchain(
    ctx: &BuildContext,
    options: &InvocationOptions,
    search: &dyn HostSearch,
) -> Result<ResolvedToolchain> {
    let tools = default_tools(&options.tool_options());

    let mut resolver =
        ToolchainResolver::new(&ctx.target, &ctx.host, &ctx.layout.tools_root, search);
    if let Some(cc) = &options.host_cc {
        resolver = resolver.with_override(ToolRole::CCompiler, cc);
    }
    if let Some(cxx) = &options.host_cxx {
        resolver = resolver.with_override(ToolRole::CxxCompiler, cxx);
    }

    let mut toolchain = resolver.resolve(&tools, options.generator);
    resolver.install_missing(&mut toolchain, &tools, ctx)?;
    toolchain.ensure_complete()?;

    for (role, tool) in toolchain.iter() {
        tracing::info!("{}: {} ({})", role, tool.path.display(), tool.origin);
    }
    Ok(toolchain)
}
