//! Implementation of `ace deps`.

use std::fmt::Write;

use anyhow::Result;

use crate::core::platform::Platform;
use crate::core::project::Project;
use crate::core::sdk::Sdk;
use crate::ops::resolve::resolve_project;
use crate::resolver::ResolvedDependencySet;

/// Resolve the modules a project uses on one platform.
pub fn deps(sdk: &Sdk, project: &Project, platform: Platform) -> Result<ResolvedDependencySet> {
    Ok(resolve_project(sdk, project, platform)?.deps)
}

/// Render a resolved set: one module per line in resolution order, each
/// followed by its library templates.
pub fn format_deps(deps: &ResolvedDependencySet) -> String {
    let mut out = String::new();
    for module in deps.modules() {
        let name = &module.entry.module;
        match &module.required_by {
            Some(parent) => {
                let _ = writeln!(out, "{} (required by {})", name, parent);
            }
            None => {
                let _ = writeln!(out, "{}", name);
            }
        }
        for template in module.entry.libraries(deps.platform()) {
            let _ = writeln!(out, "    {}", template);
        }
    }
    for name in deps.missing() {
        let _ = writeln!(out, "{} (not defined by the SDK)", name);
    }
    out
}
