//! Dependency resolution over SDK manifests.
//!
//! Resolution is a depth-first closure from the engine module plus every
//! module the project uses. There are no versions to choose: a module either
//! exists in the manifests or it is skipped with a note. Skipping is what
//! lets one tool drive several SDK releases, where optional plugins come and
//! go.

pub mod resolve;

pub use resolve::{ResolvedDependencySet, ResolvedModule};

use crate::core::manifest::ManifestStore;
use crate::core::platform::Platform;

/// The module every build starts from.
pub const BASE_MODULE: &str = "engine/arkui";

/// Computes [`ResolvedDependencySet`]s from a [`ManifestStore`].
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'a> {
    store: &'a ManifestStore,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(store: &'a ManifestStore) -> Self {
        DependencyResolver { store }
    }

    /// Resolve the closure of `base` and `requested` for one platform.
    ///
    /// Order is depth-first preorder: `base` and its dependencies come
    /// first, then each requested module in the order given. Revisiting a
    /// module is a no-op, which also terminates cycles.
    pub fn resolve<'r, I>(&self, base: &str, requested: I, platform: Platform) -> ResolvedDependencySet
    where
        I: IntoIterator<Item = &'r str>,
    {
        let mut set = ResolvedDependencySet::new(platform);

        self.visit(base, None, platform, &mut set);
        tracing::debug!("base module {}: {}", base, set.names().join(", "));

        for module in requested {
            self.visit(module, None, platform, &mut set);
        }

        set
    }

    fn visit(
        &self,
        module: &str,
        required_by: Option<&str>,
        platform: Platform,
        set: &mut ResolvedDependencySet,
    ) {
        if set.contains(module) {
            return;
        }

        let Some(entry) = self.store.get(module) else {
            match required_by {
                Some(parent) => tracing::info!(
                    "cannot find the definition of `{}` (required by `{}`), skipping",
                    module,
                    parent
                ),
                None => tracing::info!("cannot find the definition of `{}`, skipping", module),
            }
            set.record_missing(module);
            return;
        };

        set.insert(entry.clone(), required_by.map(str::to_string));

        for dep in entry.dependencies(platform) {
            self.visit(dep, Some(module), platform, set);
        }
    }
}
