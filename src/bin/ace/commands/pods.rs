//! `ace pods` command

use anyhow::Result;

use crate::cli::PodsArgs;
use crate::commands::{explain, open};
use ace::builder::{BuildContext, NotFoundHandler};
use ace::ops::{pods, BuildOptions};
use ace::util::process::SystemRunner;
use ace::util::shell::Shell;
use ace::FileType;

pub fn execute(args: PodsArgs, shell: &Shell) -> Result<()> {
    let ws = open(&args.location, true)?;

    let not_found = ws.config.not_found()?;
    let opts = BuildOptions {
        icu: !args.no_icu && ws.config.icu_enabled(),
        api_version: ws.config.sdk.api_version,
    };

    let mut ctx = BuildContext::new(ws.sdk, ws.project, FileType::Ios, false)
        .with_not_found(NotFoundHandler::fixed(not_found));

    pods(&mut ctx, shell, &SystemRunner, &opts).map_err(explain)?;
    Ok(())
}
