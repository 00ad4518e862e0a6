//! `couplet status` command

use anyhow::Result;

use couplet::core::target::TargetId;
use couplet::deps::RegistryOptions;
use couplet::ops::{format_status, status};
use couplet::util::shell::Shell;
use couplet::util::GlobalContext;

use crate::cli::StatusArgs;

pub fn execute(args: &StatusArgs, shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let target = args
        .target
        .host_target
        .clone()
        .unwrap_or_else(TargetId::host);
    let options = RegistryOptions {
        opengl_version: args.target.opengl_version.clone(),
        build_tests: args.target.build_tests,
    };

    let statuses = status(&gctx, &target, &options)?;
    shell.note(format!("dependencies of {}", target));
    print!("{}", format_status(&statuses));

    Ok(())
}
