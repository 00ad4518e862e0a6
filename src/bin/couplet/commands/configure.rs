//! `couplet configure` command

use std::sync::Arc;

use anyhow::Result;

use couplet::core::target::{HostSystem, TargetId};
use couplet::ops::{invoke, InvocationOptions, RunMode};
use couplet::util::shell::Shell;
use couplet::util::GlobalContext;

use crate::cli::{Cli, ConfigureArgs};

pub fn execute(cli: &Cli, args: &ConfigureArgs, shell: Arc<Shell>) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let options = invocation_options(cli, args, RunMode::Configure, &gctx);
    invoke(&gctx, &options, shell)
}

/// Combine the flags with the configuration into invocation options.
///
/// Flags win over the config file; the config file wins over defaults.
pub fn invocation_options(
    cli: &Cli,
    args: &ConfigureArgs,
    mode: RunMode,
    gctx: &GlobalContext,
) -> InvocationOptions {
    let config = gctx.config();

    InvocationOptions {
        mode,
        dry_run: cli.dry_run,
        clean: cli.clean,
        jobs: super::jobs(cli, config),
        print_debug: cli.print_debug,
        target: args
            .target
            .host_target
            .clone()
            .unwrap_or_else(TargetId::host),
        host: HostSystem::current(),
        variant: args
            .variant()
            .or_else(|| config.build_variant())
            .unwrap_or_default(),
        generator: args
            .generator()
            .or_else(|| config.cmake_generator())
            .unwrap_or_default(),
        compiler_toolchain: args
            .toolchain()
            .or_else(|| config.compiler_toolchain())
            .unwrap_or_default(),
        compiler_version: args.compiler_version.clone(),
        host_cc: args.host_cc.clone(),
        host_cxx: args.host_cxx.clone(),
        repository: cli.repository.clone(),
        build_tests: args.target.build_tests,
        opengl_version: args.target.opengl_version.clone(),
        auth: super::github_auth(cli, config),
    }
}
