//! Shared front half of every packaging command: finding the SDK, loading
//! its manifests and resolving the modules a project uses.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::core::collection::ModuleCollection;
use crate::core::manifest::ManifestStore;
use crate::core::platform::Platform;
use crate::core::project::Project;
use crate::core::sdk::Sdk;
use crate::resolver::{DependencyResolver, ResolvedDependencySet, BASE_MODULE};
use crate::util::config::Config;
use crate::util::diagnostic::suggestions;

/// Find the SDK for a project.
///
/// An explicit path wins over `[sdk] path` in the configuration. The API
/// level comes from the configuration, else from the project's
/// `build-profile.json5`, else the highest installed level is used.
pub fn locate_sdk(explicit: Option<&Path>, config: &Config, project: &Project) -> Result<Sdk> {
    let Some(path) = explicit.or(config.sdk.path.as_deref()) else {
        bail!("no ArkUI-X SDK configured\nhelp: {}", suggestions::NO_SDK);
    };
    let api_version = config.sdk.api_version.or_else(|| project.sdk_api_version());
    let sdk = Sdk::locate(path, api_version)?;
    tracing::debug!("using SDK at {}", sdk.root().display());
    Ok(sdk)
}

/// Manifests, requested modules and their closure for one platform.
#[derive(Debug, Clone)]
pub struct ProjectModules {
    pub store: ManifestStore,
    pub collection: ModuleCollection,
    pub deps: ResolvedDependencySet,
}

/// Load the SDK manifests and resolve the modules `project` uses.
pub fn resolve_project(sdk: &Sdk, project: &Project, platform: Platform) -> Result<ProjectModules> {
    let store = ManifestStore::load(&sdk.manifests())
        .with_context(|| format!("failed to load manifests from {}", sdk.root().display()))?;

    let collection = ModuleCollection::discover(project.root());
    if collection.is_empty() {
        tracing::warn!(
            "no module collections under {}; {}",
            project.root().display(),
            suggestions::NO_COLLECTIONS
        );
    }
    tracing::debug!(
        "{} modules requested by {} component and {} module collections",
        collection.len(),
        collection.component_files,
        collection.module_files
    );

    let deps = DependencyResolver::new(&store).resolve(BASE_MODULE, collection.iter(), platform);
    Ok(ProjectModules {
        store,
        collection,
        deps,
    })
}
