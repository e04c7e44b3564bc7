//! `ace deps` command
//!
//! Prints the resolved module set to stdout.

use anyhow::Result;

use crate::cli::DepsArgs;
use crate::commands::{explain, open};
use ace::ops::{deps, format_deps};

pub fn execute(args: DepsArgs) -> Result<()> {
    let ws = open(&args.location, false)?;
    let set = deps(&ws.sdk, &ws.project, args.platform).map_err(explain)?;
    print!("{}", format_deps(&set));
    Ok(())
}
