//! Module usage collections written by the OpenHarmony build.
//!
//! hvigor records the components and modules a project actually imports in
//! `component_collection.json` and `module_collection.json` under
//! `<module>/build/<product>/cache/`. Their union is the set of modules the
//! native project must ship on top of the engine.

use std::path::{Component, Path};

use serde_json::Value;
use walkdir::WalkDir;

/// File names that carry module usage.
pub const COLLECTION_FILES: [&str; 2] = ["component_collection.json", "module_collection.json"];

/// Directories never searched for collections.
const SKIPPED_DIRS: [&str; 5] = [".arkui-x", "node_modules", "oh_modules", ".git", ".hvigor"];

/// An insertion-ordered set of requested module names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleCollection {
    modules: Vec<String>,
    pub component_files: usize,
    pub module_files: usize,
}

impl ModuleCollection {
    pub fn new() -> Self {
        ModuleCollection::default()
    }

    /// Add a module name. Returns false if it was already present.
    pub fn add(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.modules.contains(&name) {
            return false;
        }
        self.modules.push(name);
        true
    }

    /// Merge one collection document: an object whose values are arrays of names.
    pub fn add_document(&mut self, doc: &Value) {
        let Some(map) = doc.as_object() else {
            tracing::warn!("collection document is not a JSON object, ignoring");
            return;
        };
        for list in map.values() {
            if let Some(items) = list.as_array() {
                for item in items.iter().filter_map(Value::as_str) {
                    self.add(item);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Discover and merge every collection file beneath `project_dir`.
    ///
    /// Only files whose path passes through a `build` directory and, after
    /// it, a `cache` directory are read. Unreadable or malformed files are
    /// logged and skipped.
    pub fn discover(project_dir: &Path) -> Self {
        let mut collection = ModuleCollection::new();

        let walker = WalkDir::new(project_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir()
                    && e.depth() > 0
                    && SKIPPED_DIRS.iter().any(|d| e.file_name() == *d))
            });

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !COLLECTION_FILES.contains(&name.as_ref()) {
                continue;
            }
            let relative = entry.path().strip_prefix(project_dir).unwrap_or(entry.path());
            if !under_build_cache(relative) {
                continue;
            }

            let doc = match std::fs::read_to_string(entry.path())
                .map_err(anyhow::Error::from)
                .and_then(|text| serde_json::from_str::<Value>(&text).map_err(Into::into))
            {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!("skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            tracing::debug!("loaded {}", relative.display());
            collection.add_document(&doc);
            if name == COLLECTION_FILES[0] {
                collection.component_files += 1;
            } else {
                collection.module_files += 1;
            }
        }

        collection
    }
}

/// Whether a relative path has a `build` component followed later by a `cache` component.
fn under_build_cache(path: &Path) -> bool {
    let mut seen_build = false;
    let parent = path.parent().unwrap_or(path);
    for component in parent.components() {
        if let Component::Normal(name) = component {
            if !seen_build && name == "build" {
                seen_build = true;
            } else if seen_build && name == "cache" {
                return true;
            }
        }
    }
    false
}
