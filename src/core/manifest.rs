//! SDK module manifests (`apiConfig.json`).
//!
//! An ArkUI-X SDK ships three manifest documents: one for the engine, one
//! for API plugins and one for component plugins. Each is a JSON array of
//! records declaring, per platform, the library files a module needs and
//! the modules it depends on. All three are merged into one [`ManifestStore`]
//! keyed by module name; a later document overrides an earlier record with
//! the same name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::core::platform::Platform;
use crate::core::template::{PathTemplate, UnknownPlaceholder};

/// Errors loading SDK manifests. All of them are fatal for a build.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("could not find manifest `{}`", .path.display())]
    #[diagnostic(
        code(ace::manifest::not_found),
        help("Check that the ArkUI-X SDK path is correct and the SDK is complete")
    )]
    NotFound { path: PathBuf },

    #[error("failed to read manifest `{}`", .path.display())]
    #[diagnostic(code(ace::manifest::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest `{}`", .path.display())]
    #[diagnostic(
        code(ace::manifest::parse),
        help("The manifest must be a JSON array of {{module, library, deps}} records")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("module `{module}` has an invalid library path")]
    #[diagnostic(
        code(ace::manifest::placeholder),
        help("Only `arch_type` and `build_modes` can be substituted in library paths")
    )]
    Placeholder {
        module: String,
        #[source]
        source: UnknownPlaceholder,
    },
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    module: String,
    #[serde(default)]
    library: RawPlatformLists,
    #[serde(default)]
    deps: RawPlatformLists,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlatformLists {
    #[serde(default)]
    android: Vec<String>,
    #[serde(default)]
    ios: Vec<String>,
}

/// Per-platform ordered lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformLists<T> {
    pub android: Vec<T>,
    pub ios: Vec<T>,
}

impl<T> PlatformLists<T> {
    /// The list for a platform. Simulator builds read the `ios` list.
    pub fn get(&self, platform: Platform) -> &[T] {
        match platform {
            Platform::Android => &self.android,
            Platform::Ios | Platform::IosSimulator => &self.ios,
        }
    }
}

/// One buildable module as declared by the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleManifestEntry {
    pub module: String,
    pub library: PlatformLists<PathTemplate>,
    pub deps: PlatformLists<String>,
}

impl ModuleManifestEntry {
    /// Library path templates for a platform.
    pub fn libraries(&self, platform: Platform) -> &[PathTemplate] {
        self.library.get(platform)
    }

    /// Direct dependencies for a platform.
    pub fn dependencies(&self, platform: Platform) -> &[String] {
        self.deps.get(platform)
    }
}

/// A manifest document together with the directory its paths are relative to.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    pub document: PathBuf,
    pub root: PathBuf,
}

impl ManifestSource {
    pub fn new(document: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        ManifestSource {
            document: document.into(),
            root: root.into(),
        }
    }

    /// The engine, API plugin and component plugin manifests of an SDK, in load order.
    pub fn sdk_defaults(sdk_root: &Path) -> Vec<ManifestSource> {
        ["engine", "plugins/api", "plugins/component"]
            .iter()
            .map(|dir| {
                let root = sdk_root.join(dir);
                ManifestSource::new(root.join("apiConfig.json"), root)
            })
            .collect()
    }
}

/// All module manifests known to a build, indexed by module name.
#[derive(Debug, Clone, Default)]
pub struct ManifestStore {
    entries: HashMap<String, ModuleManifestEntry>,
    /// First-seen order, used wherever the whole store is iterated.
    order: Vec<String>,
}

impl ManifestStore {
    pub fn new() -> Self {
        ManifestStore::default()
    }

    /// Load the three standard manifests of an SDK.
    pub fn load_sdk(sdk_root: &Path) -> Result<Self, ManifestError> {
        Self::load(&ManifestSource::sdk_defaults(sdk_root))
    }

    /// Load and merge manifest documents in order.
    pub fn load(sources: &[ManifestSource]) -> Result<Self, ManifestError> {
        let mut store = ManifestStore::new();
        for source in sources {
            tracing::debug!("loading manifest {}", source.document.display());
            if !source.document.exists() {
                return Err(ManifestError::NotFound {
                    path: source.document.clone(),
                });
            }
            let text = std::fs::read_to_string(&source.document).map_err(|e| {
                ManifestError::Read {
                    path: source.document.clone(),
                    source: e,
                }
            })?;
            store.add_document(&text, &source.document, &source.root)?;
        }
        Ok(store)
    }

    /// Parse one document and merge its records, prefixing library paths with `root`.
    pub fn add_document(
        &mut self,
        text: &str,
        document: &Path,
        root: &Path,
    ) -> Result<(), ManifestError> {
        let raw: Vec<RawEntry> =
            serde_json::from_str(text).map_err(|e| ManifestError::Parse {
                path: document.to_path_buf(),
                source: e,
            })?;

        for entry in raw {
            let module = entry.module;
            let parse_all = |paths: Vec<String>| -> Result<Vec<PathTemplate>, ManifestError> {
                paths
                    .into_iter()
                    .map(|p| {
                        let relative = p.trim_start_matches(['/', '\\']).to_string();
                        PathTemplate::parse(relative)
                            .map(|t| t.prefixed(root))
                            .map_err(|e| ManifestError::Placeholder {
                                module: module.clone(),
                                source: e,
                            })
                    })
                    .collect()
            };

            let library = PlatformLists {
                android: parse_all(entry.library.android)?,
                ios: parse_all(entry.library.ios)?,
            };

            for platform in [Platform::Android, Platform::Ios] {
                if library.get(platform).is_empty() && entry.deps.get(platform).is_empty() {
                    tracing::debug!(
                        "module `{}` declares nothing for {}",
                        module,
                        platform.manifest_key()
                    );
                }
            }

            self.insert(ModuleManifestEntry {
                module: module.clone(),
                library,
                deps: PlatformLists {
                    android: entry.deps.android,
                    ios: entry.deps.ios,
                },
            });
        }
        Ok(())
    }

    /// Insert a record. A record with the same module name is replaced in place.
    pub fn insert(&mut self, entry: ModuleManifestEntry) {
        if !self.entries.contains_key(&entry.module) {
            self.order.push(entry.module.clone());
        }
        self.entries.insert(entry.module.clone(), entry);
    }

    pub fn get(&self, module: &str) -> Option<&ModuleManifestEntry> {
        self.entries.get(module)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.entries.contains_key(module)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate over every record in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleManifestEntry> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }
}

impl RawPlatformLists {
    fn get(&self, platform: Platform) -> &[String] {
        match platform {
            Platform::Android => &self.android,
            Platform::Ios | Platform::IosSimulator => &self.ios,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ENGINE: &str = r#"[
        {"module": "engine/arkui",
         "library": {"android": ["lib/arch_type/libarkui_android.so"], "ios": ["lib/libarkui_ios.xcframework"]},
         "deps": {}}
    ]"#;

    #[test]
    fn test_paths_are_prefixed_with_root() {
        let mut store = ManifestStore::new();
        store
            .add_document(ENGINE, Path::new("apiConfig.json"), Path::new("/sdk/engine"))
            .unwrap();

        let arkui = store.get("engine/arkui").unwrap();
        let android = arkui.libraries(Platform::Android);
        assert_eq!(android.len(), 1);
        assert_eq!(
            android[0].render("android-arm64-release", "release"),
            "/sdk/engine/lib/android-arm64-release/libarkui_android.so"
        );
        assert_eq!(
            arkui.libraries(Platform::IosSimulator)[0].raw(),
            "/sdk/engine/lib/libarkui_ios.xcframework"
        );
    }

    #[test]
    fn test_later_documents_win() {
        let mut store = ManifestStore::new();
        store
            .add_document(ENGINE, Path::new("a.json"), Path::new("/a"))
            .unwrap();
        store
            .add_document(
                r#"[{"module": "plugin.i18n", "library": {"android": [], "ios": []}},
                    {"module": "engine/arkui", "library": {"android": ["other.so"], "ios": []}}]"#,
                Path::new("b.json"),
                Path::new("/b"),
            )
            .unwrap();

        assert_eq!(store.len(), 2);
        let names: Vec<_> = store.iter().map(|e| e.module.as_str()).collect();
        assert_eq!(names, ["engine/arkui", "plugin.i18n"]);
        assert_eq!(
            store.get("engine/arkui").unwrap().libraries(Platform::Android)[0].raw(),
            "/b/other.so"
        );
    }

    #[test]
    fn test_missing_deps_and_library_default_to_empty() {
        let mut store = ManifestStore::new();
        store
            .add_document(r#"[{"module": "bare"}]"#, Path::new("x.json"), Path::new("/x"))
            .unwrap();
        let bare = store.get("bare").unwrap();
        assert!(bare.dependencies(Platform::Android).is_empty());
        assert!(bare.libraries(Platform::Ios).is_empty());
    }

    #[test]
    fn test_unknown_placeholder_is_fatal() {
        let mut store = ManifestStore::new();
        let err = store
            .add_document(
                r#"[{"module": "bad", "library": {"android": ["lib_{abi}.so"], "ios": []}}]"#,
                Path::new("x.json"),
                Path::new("/x"),
            )
            .unwrap_err();
        assert!(matches!(err, ManifestError::Placeholder { ref module, .. } if module == "bad"));
    }

    #[test]
    fn test_missing_document_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = ManifestStore::load_sdk(tmp.path()).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let engine = tmp.path().join("engine");
        fs::create_dir_all(&engine).unwrap();
        fs::write(engine.join("apiConfig.json"), "{ not json").unwrap();

        let err = ManifestStore::load(&[ManifestSource::new(engine.join("apiConfig.json"), &engine)])
            .unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }
}
