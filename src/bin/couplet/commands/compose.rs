//! `couplet compose` command

use std::sync::Arc;

use anyhow::Result;

use couplet::ops::{invoke, ComposeOptions, RunMode};
use couplet::util::shell::Shell;
use couplet::util::GlobalContext;

use crate::cli::{Cli, ComposeArgs};
use crate::commands::configure::invocation_options;

pub fn execute(cli: &Cli, args: &ComposeArgs, shell: Arc<Shell>) -> Result<()> {
    let gctx = GlobalContext::new()?;

    let compose = ComposeOptions {
        ode_version: args.ode_version.clone(),
        anthem_version: args.anthem_version.clone(),
        ode_window_name: args.ode_window_name.clone(),
        anthem_window_name: args.anthem_window_name.clone(),
        ode_logger_name: args.ode_logger_name.clone(),
        anthem_logger_name: args.anthem_logger_name.clone(),
        ode_binaries_name: args.ode_binaries_name.clone(),
        anthem_binaries_name: args.anthem_binaries_name.clone(),
        assertions: !args.no_assertions,
        developer_build: args.developer_build,
        build_libs: args.build_libs,
    };

    let options = invocation_options(cli, &args.build, RunMode::Compose(compose), &gctx);
    invoke(&gctx, &options, shell)
}
