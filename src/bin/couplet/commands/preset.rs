//! `couplet preset` command

use anyhow::{Context, Result};

use couplet::ops::preset::default_preset_files;
use couplet::ops::{run_preset, PresetOptions};
use couplet::util::shell::Shell;
use couplet::util::GlobalContext;

use crate::cli::{Cli, PresetArgs};

pub fn execute(cli: &Cli, args: &PresetArgs, shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let program = std::env::current_exe().context("failed to locate the couplet executable")?;

    let options = PresetOptions {
        mode: args.mode.into(),
        files: args.files.clone(),
        name: args.name.clone(),
        show: args.show,
        expand_script_invocation: args.expand_script_invocation,
        substitutions: args.substitutions.clone(),
        dry_run: cli.dry_run,
        clean: cli.clean,
        print_debug: cli.print_debug,
        jobs: cli.jobs,
    };

    run_preset(
        &options,
        default_preset_files(gctx.cwd(), &cli.repository),
        &program,
        shell,
    )
}
