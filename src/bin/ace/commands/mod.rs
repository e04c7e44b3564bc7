//! Command implementations

pub mod build;
pub mod completions;
pub mod deps;
pub mod pods;

use anyhow::Result;

use crate::cli::{Cli, LocationArgs};
use ace::builder::{LocateError, PbxprojError};
use ace::core::manifest::ManifestError;
use ace::ops::locate_sdk;
use ace::util::diagnostic::{suggestions, Diagnostic};
use ace::util::shell::{ColorChoice, Shell};
use ace::util::{Config, GlobalContext};
use ace::{Project, Sdk};

pub fn shell(cli: &Cli) -> Shell {
    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    Shell::from_flags(cli.quiet, cli.verbose, color)
}

/// A project with its merged configuration and SDK.
pub struct Workspace {
    pub project: Project,
    pub config: Config,
    pub sdk: Sdk,
}

/// Find the project, load its configuration and locate the SDK.
///
/// With `native`, the project must already have generated native projects.
pub fn open(location: &LocationArgs, native: bool) -> Result<Workspace> {
    let gctx = GlobalContext::new()?;
    let root = gctx.project_root(location.project.as_deref());
    let project = Project::new(&root);

    if native && !project.native_dir().is_dir() {
        return Err(Diagnostic::error(format!(
            "no ArkUI-X native projects in {}",
            root.display()
        ))
        .with_location(project.native_dir())
        .with_suggestion(suggestions::NO_NATIVE_PROJECT)
        .into());
    }

    let config = gctx.load_config(&root);
    let sdk = locate_sdk(location.sdk.as_deref(), &config, &project)?;
    Ok(Workspace {
        project,
        config,
        sdk,
    })
}

/// Turn typed library errors into diagnostics carrying their help text.
pub fn explain(err: anyhow::Error) -> anyhow::Error {
    let diagnostic = if let Some(e) = err.downcast_ref::<LocateError>() {
        let diagnostic = from_miette(e);
        match e {
            LocateError::LibraryNotFound { module, .. } => diagnostic
                .with_context(format!("required by module `{}`", module))
                .with_suggestion(suggestions::LIBRARY_MISSING),
            LocateError::NoDestination { .. } => diagnostic,
        }
    } else if let Some(e) = err.downcast_ref::<PbxprojError>() {
        from_miette(e)
    } else if let Some(e) = err.downcast_ref::<ManifestError>() {
        from_miette(e)
    } else {
        return err;
    };
    diagnostic.into()
}

fn from_miette(e: &dyn miette::Diagnostic) -> Diagnostic {
    let mut diagnostic = Diagnostic::error(e.to_string());
    if let Some(code) = e.code() {
        diagnostic = diagnostic.with_context(format!("code: {}", code));
    }
    if let Some(help) = e.help() {
        diagnostic = diagnostic.with_suggestion(help.to_string());
    }
    diagnostic
}
