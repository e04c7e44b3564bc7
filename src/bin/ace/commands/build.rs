//! `ace build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::commands::{explain, open};
use ace::builder::{BuildContext, NotFoundHandler};
use ace::core::platform::BuildProfile;
use ace::ops::{build, BuildOptions};
use ace::util::config::split_list;
use ace::util::process::SystemRunner;
use ace::util::shell::Shell;

pub fn execute(args: BuildArgs, shell: &Shell) -> Result<()> {
    let ws = open(&args.location, true)?;

    // CLI flags win over configuration
    let target_platforms = match &args.target_platform {
        Some(list) => split_list(list),
        None => ws.config.target_platforms(),
    };
    let not_found = ws.config.not_found()?;
    let opts = BuildOptions {
        icu: !args.no_icu && ws.config.icu_enabled(),
        api_version: ws.config.sdk.api_version,
    };

    let mut ctx = BuildContext::new(ws.sdk, ws.project, args.file_type, args.simulator)
        .with_profile(BuildProfile::from_flags(args.debug, args.profile))
        .with_target_platforms(target_platforms)
        .with_clear_lib(args.clear_lib || ws.config.clear_lib_before_copy())
        .with_dry_run(args.dry_run)
        .with_not_found(NotFoundHandler::fixed(not_found));

    let summary = build(&mut ctx, shell, &SystemRunner, &opts).map_err(explain)?;

    if !summary.missing_libraries.is_empty() {
        shell.warn(format!(
            "{} libraries declared by the SDK manifests were not found and were skipped",
            summary.missing_libraries.len()
        ));
    }

    Ok(())
}
