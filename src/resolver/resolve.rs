//! ResolvedDependencySet - the ordered closure of required modules.

use std::collections::HashMap;

use crate::core::manifest::ModuleManifestEntry;
use crate::core::platform::Platform;

/// One module in a resolved set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub entry: ModuleManifestEntry,
    /// The module whose `deps` pulled this one in; `None` for roots.
    pub required_by: Option<String>,
}

/// Modules required by one build, in resolution order.
///
/// A module appears at most once. Lookups are by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependencySet {
    platform: Platform,
    modules: Vec<ResolvedModule>,
    index: HashMap<String, usize>,
    /// Names requested or depended on that the manifests do not define.
    missing: Vec<String>,
}

impl ResolvedDependencySet {
    pub fn new(platform: Platform) -> Self {
        ResolvedDependencySet {
            platform,
            modules: Vec::new(),
            index: HashMap::new(),
            missing: Vec::new(),
        }
    }

    /// The platform this set was resolved for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Insert a module. Returns false if it was already present.
    pub fn insert(&mut self, entry: ModuleManifestEntry, required_by: Option<String>) -> bool {
        if self.index.contains_key(&entry.module) {
            return false;
        }
        self.index.insert(entry.module.clone(), self.modules.len());
        self.modules.push(ResolvedModule { entry, required_by });
        true
    }

    pub(crate) fn record_missing(&mut self, name: &str) {
        if !self.missing.iter().any(|m| m == name) {
            self.missing.push(name.to_string());
        }
    }

    pub fn contains(&self, module: &str) -> bool {
        self.index.contains_key(module)
    }

    pub fn get(&self, module: &str) -> Option<&ResolvedModule> {
        self.index.get(module).and_then(|&i| self.modules.get(i))
    }

    /// Manifest records in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleManifestEntry> {
        self.modules.iter().map(|m| &m.entry)
    }

    /// Resolved modules with their provenance.
    pub fn modules(&self) -> &[ResolvedModule] {
        &self.modules
    }

    /// Module names in resolution order.
    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.entry.module.as_str()).collect()
    }

    /// Names that could not be found in the manifests.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
