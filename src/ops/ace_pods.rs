//! Implementation of `ace pods`: publish the SDK frameworks as a CocoaPod
//! instead of copying them into the project.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::builder::context::NotFoundAction;
use crate::builder::icu::IcuOutcome;
use crate::builder::locator::LocateError;
use crate::builder::podspec::{self, PodfileEdit};
use crate::builder::BuildContext;
use crate::ops::ace_build::{package_icu, BuildOptions};
use crate::ops::resolve::resolve_project;
use crate::util::fs as ace_fs;
use crate::util::process::CommandRunner;
use crate::util::shell::{Shell, Status};

/// What `ace pods` did.
#[derive(Debug, Clone, Default)]
pub struct PodsSummary {
    pub podspec: PathBuf,
    /// SDK-relative framework paths listed in the podspec.
    pub vendored: Vec<String>,
    /// Whether the pod line was added to the Podfile.
    pub podfile_updated: bool,
    pub icu: Option<IcuOutcome>,
}

/// Write the SDK podspec and reference it from the project's Podfile.
pub fn pods(
    ctx: &mut BuildContext,
    shell: &Shell,
    runner: &dyn CommandRunner,
    opts: &BuildOptions,
) -> Result<PodsSummary> {
    if !ctx.platform.is_ios() {
        bail!("`ace pods` needs an iOS file type, got `{}`", ctx.file_type);
    }

    let modules = resolve_project(&ctx.sdk, &ctx.project, ctx.platform)?;
    let deps = &modules.deps;
    shell.status(
        Status::Resolving,
        format!("{} modules for {}", deps.len(), ctx.platform),
    );

    let arch = ctx
        .layout
        .arch_token(ctx.platform, "arm64", ctx.profile)
        .unwrap_or("ios-release");

    let mut names: Vec<String> = Vec::new();
    for entry in deps.iter() {
        for template in entry.libraries(ctx.platform) {
            let path = template.render_path(arch, ctx.profile.as_str());
            if !path.exists()
                && ctx.not_found.handle(&entry.module, &path) == NotFoundAction::Abort
            {
                return Err(LocateError::LibraryNotFound {
                    module: entry.module.clone(),
                    path,
                }
                .into());
            }
            if let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }

    let vendored = podspec::vendored_frameworks(ctx.sdk.root(), names.iter().map(String::as_str));
    let podspec_path = ctx.sdk.podspec_path();
    let podfile_path = ctx.project.podfile();
    let target = ctx
        .project
        .xcode_projects()
        .ok()
        .and_then(|p| p.into_iter().next())
        .unwrap_or_else(|| "app".to_string());

    let podfile = ace_fs::read_to_string(&podfile_path)
        .with_context(|| "`ace pods` needs a Podfile in .arkui-x/ios")?;
    let edit = podspec::insert_pod(&podfile, &target, ctx.sdk.root())?;

    let mut summary = PodsSummary {
        podspec: podspec_path.clone(),
        vendored,
        podfile_updated: matches!(edit, PodfileEdit::Inserted(_)),
        icu: None,
    };

    if ctx.dry_run {
        shell.status(
            Status::Planned,
            format!(
                "write {} with {} frameworks",
                podspec_path.display(),
                summary.vendored.len()
            ),
        );
        if summary.podfile_updated {
            shell.status(Status::Planned, format!("add the {} pod to the Podfile", podspec::POD_NAME));
        }
    } else {
        ace_fs::write_string(&podspec_path, &podspec::render_podspec(&summary.vendored))?;
        shell.status(
            Status::Created,
            format!("{} ({} frameworks)", podspec_path.display(), summary.vendored.len()),
        );
        match &edit {
            PodfileEdit::Inserted(text) => {
                ace_fs::write_string(&podfile_path, text)?;
                shell.status(Status::Updated, "Podfile");
            }
            PodfileEdit::Unchanged => tracing::debug!("Podfile already references the SDK"),
            PodfileEdit::NoTarget => shell.warn(format!(
                "no `target '{}' do` block in the Podfile, add `pod '{}'` yourself",
                target,
                podspec::POD_NAME
            )),
        }
    }

    if opts.icu {
        let api_version = opts.api_version.or_else(|| ctx.project.sdk_api_version());
        summary.icu = package_icu(ctx, shell, runner, deps, api_version)?;
    }

    Ok(summary)
}
