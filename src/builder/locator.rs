//! Expanding resolved modules into concrete library files per architecture.
//!
//! A [`LibraryMap`] groups located files by the project directory they
//! belong in. Two maps are built per architecture: one for the modules the
//! build requires, and one for every module the SDK declares. The second is
//! what sync uses to recognise files it is allowed to remove.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::builder::context::{NotFoundAction, NotFoundHandler};
use crate::core::layout::DestinationMap;
use crate::core::manifest::{ManifestStore, ModuleManifestEntry};
use crate::core::platform::Platform;

/// Fatal errors while locating libraries.
#[derive(Debug, Error, Diagnostic)]
pub enum LocateError {
    #[error("no destination for `.{extension}` files (library `{}` of module `{module}`)", .path.display())]
    #[diagnostic(
        code(ace::locate::no_destination),
        help("The {platform} layout places only: {known}")
    )]
    NoDestination {
        module: String,
        path: PathBuf,
        extension: String,
        platform: Platform,
        known: String,
    },

    #[error("library not found: {}", .path.display())]
    #[diagnostic(
        code(ace::locate::not_found),
        help("Module `{module}` declares this library; check that the SDK is complete")
    )]
    LibraryNotFound { module: String, path: PathBuf },
}

/// One library file for one module and architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryArtifact {
    pub module: String,
    /// Concrete path in the SDK.
    pub source: PathBuf,
    /// Whether `source` existed when it was located.
    pub exists: bool,
}

/// Located libraries grouped by destination directory, then by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryMap {
    dirs: BTreeMap<PathBuf, BTreeMap<String, LibraryArtifact>>,
}

impl LibraryMap {
    pub fn new() -> Self {
        LibraryMap::default()
    }

    /// Register a destination directory with no files yet.
    pub fn touch(&mut self, dir: &Path) {
        self.dirs.entry(dir.to_path_buf()).or_default();
    }

    /// Add a file. The first artifact registered under a name wins.
    pub fn insert(&mut self, dir: &Path, file_name: String, artifact: LibraryArtifact) {
        self.dirs
            .entry(dir.to_path_buf())
            .or_default()
            .entry(file_name)
            .or_insert(artifact);
    }

    /// Merge another map into this one.
    pub fn extend(&mut self, other: LibraryMap) {
        for (dir, files) in other.dirs {
            let entry = self.dirs.entry(dir).or_default();
            for (name, artifact) in files {
                entry.entry(name).or_insert(artifact);
            }
        }
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.keys().map(PathBuf::as_path)
    }

    /// Files for one destination directory.
    pub fn files(&self, dir: &Path) -> Option<&BTreeMap<String, LibraryArtifact>> {
        self.dirs.get(dir)
    }

    pub fn contains(&self, dir: &Path, file_name: &str) -> bool {
        self.dirs
            .get(dir)
            .is_some_and(|files| files.contains_key(file_name))
    }

    /// Every file name across all directories.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.dirs
            .values()
            .flat_map(|files| files.keys().map(String::as_str))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &BTreeMap<String, LibraryArtifact>)> {
        self.dirs.iter().map(|(d, f)| (d.as_path(), f))
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

/// File extension used for bucket lookup: the text after the last `.` of the name.
pub fn library_extension(file_name: &str) -> &str {
    file_name.rsplit_once('.').map_or("", |(_, ext)| ext)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Maps manifest templates to concrete files for one architecture.
#[derive(Debug, Clone, Copy)]
pub struct ArchitectureLibraryLocator<'a> {
    platform: Platform,
    arch_type: &'a str,
    build_modes: &'a str,
    destinations: &'a DestinationMap,
}

impl<'a> ArchitectureLibraryLocator<'a> {
    pub fn new(
        platform: Platform,
        arch_type: &'a str,
        build_modes: &'a str,
        destinations: &'a DestinationMap,
    ) -> Self {
        ArchitectureLibraryLocator {
            platform,
            arch_type,
            build_modes,
            destinations,
        }
    }

    /// Locate the libraries of the required modules.
    ///
    /// Missing files go through `not_found`; a skipped file still counts as
    /// required so an earlier copy of it is never treated as unused. Every
    /// file must have a destination bucket, present or not.
    pub fn locate<'m>(
        &self,
        modules: impl IntoIterator<Item = &'m ModuleManifestEntry>,
        not_found: &mut NotFoundHandler,
    ) -> Result<LibraryMap, LocateError> {
        let mut map = LibraryMap::new();
        for dir in self.destinations.directories() {
            map.touch(dir);
        }

        for entry in modules {
            for template in entry.libraries(self.platform) {
                let source = template.render_path(self.arch_type, self.build_modes);
                let exists = source.exists();

                if !exists && not_found.handle(&entry.module, &source) == NotFoundAction::Abort {
                    return Err(LocateError::LibraryNotFound {
                        module: entry.module.clone(),
                        path: source,
                    });
                }

                let file_name = file_name_of(&source);
                let extension = library_extension(&file_name);
                let Some(dir) = self.destinations.for_extension(extension) else {
                    return Err(LocateError::NoDestination {
                        module: entry.module.clone(),
                        extension: extension.to_string(),
                        path: source,
                        platform: self.platform,
                        known: self.destinations.extensions().join(", "),
                    });
                };

                map.insert(
                    dir,
                    file_name,
                    LibraryArtifact {
                        module: entry.module.clone(),
                        source,
                        exists,
                    },
                );
            }
        }

        Ok(map)
    }

    /// Locate every library the SDK declares that exists on disk.
    ///
    /// Files without a destination bucket are skipped: a module the build
    /// does not use must never fail it.
    pub fn locate_all(&self, store: &ManifestStore) -> LibraryMap {
        let mut map = LibraryMap::new();
        for entry in store.iter() {
            for template in entry.libraries(self.platform) {
                let source = template.render_path(self.arch_type, self.build_modes);
                if !source.exists() {
                    continue;
                }
                let file_name = file_name_of(&source);
                let Some(dir) = self
                    .destinations
                    .for_extension(library_extension(&file_name))
                else {
                    tracing::debug!(
                        "{}: no destination for {}, not managed",
                        entry.module,
                        source.display()
                    );
                    continue;
                };
                map.insert(
                    dir,
                    file_name,
                    LibraryArtifact {
                        module: entry.module.clone(),
                        source,
                        exists: true,
                    },
                );
            }
        }
        map
    }
}
