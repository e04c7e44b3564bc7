//! Splicing SDK frameworks into Xcode project files.
//!
//! A library appears in up to five sections of `project.pbxproj`, tied
//! together by three object identifiers:
//!
//! | section                  | entry                                   |
//! |--------------------------|-----------------------------------------|
//! | `PBXBuildFile`           | `build` (and `embed` for apps) → `file` |
//! | `PBXCopyFilesBuildPhase` | `embed` (apps only)                     |
//! | `PBXFileReference`       | `file`                                  |
//! | `PBXFrameworksBuildPhase`| `build`                                 |
//! | `PBXGroup` (Frameworks)  | `file`                                  |
//!
//! Identifiers already in the file are reused, so a library half-spliced by
//! an earlier run is completed with consistent references. New identifiers
//! never collide with anything in the file or with each other.

pub mod anchors;
pub mod section;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Result;
use miette::Diagnostic;
use thiserror::Error;

use crate::core::platform::FileType;
use crate::util::fs as ace_fs;

pub use anchors::SectionKind;
use section::{Entry, Section};

#[derive(Debug, Error, Diagnostic)]
pub enum PbxprojError {
    #[error("Xcode project file not found: {}", .path.display())]
    #[diagnostic(
        code(ace::pbxproj::missing),
        help("Run the build from the project root, or regenerate `.arkui-x/ios`")
    )]
    Missing { path: PathBuf },

    #[error("could not find {chain} in the {section} section")]
    #[diagnostic(
        code(ace::pbxproj::anchor),
        help("Regenerate the Xcode project from the ArkUI-X template, then rebuild")
    )]
    AnchorNotFound { section: SectionKind, chain: String },

    #[error("could not find end \"{end}\" for {chain} in the {section} section")]
    #[diagnostic(
        code(ace::pbxproj::end),
        help("The project file may be truncated; restore it from version control")
    )]
    EndNotFound {
        section: SectionKind,
        end: &'static str,
        chain: String,
    },
}

/// Which stanza variant a project receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    /// The application project: frameworks are linked and embedded.
    App,
    /// A framework project: frameworks are linked only.
    Framework,
}

impl ProjectKind {
    pub fn for_file_type(file_type: FileType) -> Self {
        if file_type.is_framework() {
            ProjectKind::Framework
        } else {
            ProjectKind::App
        }
    }

    /// Sections spliced for this kind, in splice order.
    pub fn sections(self) -> &'static [SectionKind] {
        match self {
            ProjectKind::App => &[
                SectionKind::BuildFile,
                SectionKind::CopyFilesBuildPhase,
                SectionKind::FileReference,
                SectionKind::FrameworksBuildPhase,
                SectionKind::FrameworksGroup,
            ],
            ProjectKind::Framework => &[
                SectionKind::BuildFile,
                SectionKind::FileReference,
                SectionKind::FrameworksBuildPhase,
                SectionKind::FrameworksGroup,
            ],
        }
    }

    /// Directory of the copied frameworks, relative to the project file's group.
    fn frameworks_dir(self) -> &'static str {
        match self {
            ProjectKind::App => "frameworks",
            ProjectKind::Framework => "../frameworks",
        }
    }
}

/// Identifiers tying one library's entries together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryIds {
    /// `PBXBuildFile` linking the framework.
    pub build: String,
    /// `PBXBuildFile` embedding the framework.
    pub embed: String,
    /// `PBXFileReference` of the framework.
    pub file_ref: String,
}

/// Generates 24-digit uppercase hex identifiers unique within one file.
#[derive(Debug)]
pub struct IdGenerator<'t> {
    text: &'t str,
    generated: HashSet<String>,
}

impl<'t> IdGenerator<'t> {
    pub fn new(text: &'t str) -> Self {
        IdGenerator {
            text,
            generated: HashSet::new(),
        }
    }

    pub fn next_id(&mut self) -> String {
        loop {
            let id = uuid::Uuid::new_v4().simple().to_string()[..24].to_uppercase();
            if !self.text.contains(&id) && self.generated.insert(id.clone()) {
                return id;
            }
        }
    }
}

/// One kind of entry a library needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stanza {
    LinkBuildFile,
    EmbedBuildFile,
    EmbedCopy,
    FileReference,
    LinkPhase,
    GroupChild,
}

const LINK_MARKER: &str = " in Frameworks */";
const EMBED_MARKER: &str = " in Embed Frameworks */";

impl Stanza {
    fn for_section(section: SectionKind, kind: ProjectKind) -> &'static [Stanza] {
        match (section, kind) {
            (SectionKind::BuildFile, ProjectKind::App) => {
                &[Stanza::LinkBuildFile, Stanza::EmbedBuildFile]
            }
            (SectionKind::BuildFile, ProjectKind::Framework) => &[Stanza::LinkBuildFile],
            (SectionKind::CopyFilesBuildPhase, _) => &[Stanza::EmbedCopy],
            (SectionKind::FileReference, _) => &[Stanza::FileReference],
            (SectionKind::FrameworksBuildPhase, _) => &[Stanza::LinkPhase],
            (SectionKind::FrameworksGroup, _) => &[Stanza::GroupChild],
        }
    }

    /// Whether `entry` already is this stanza for its library.
    fn matches(self, entry: &Entry) -> bool {
        match self {
            Stanza::LinkBuildFile => entry.line.contains(LINK_MARKER),
            Stanza::EmbedBuildFile => entry.line.contains(EMBED_MARKER),
            _ => true,
        }
    }

    fn render(self, lib: &str, ids: &LibraryIds, kind: ProjectKind) -> String {
        match self {
            Stanza::LinkBuildFile => format!(
                "{} /* {} in Frameworks */ = {{isa = PBXBuildFile; fileRef = {} /* {} */; }};",
                ids.build, lib, ids.file_ref, lib
            ),
            Stanza::EmbedBuildFile => format!(
                "{} /* {} in Embed Frameworks */ = {{isa = PBXBuildFile; fileRef = {} /* {} */; \
                 settings = {{ATTRIBUTES = (CodeSignOnCopy, RemoveHeadersOnCopy, ); }}; }};",
                ids.embed, lib, ids.file_ref, lib
            ),
            Stanza::EmbedCopy => format!("{} /* {} in Embed Frameworks */,", ids.embed, lib),
            Stanza::FileReference => format!(
                "{} /* {} */ = {{isa = PBXFileReference; lastKnownFileType = wrapper.xcframework; \
                 name = {}; path = {}/{}; sourceTree = \"<group>\"; }};",
                ids.file_ref,
                lib,
                lib,
                kind.frameworks_dir(),
                lib
            ),
            Stanza::LinkPhase => format!("{} /* {} in Frameworks */,", ids.build, lib),
            Stanza::GroupChild => format!("{} /* {} */,", ids.file_ref, lib),
        }
    }
}

/// What one splice changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpliceReport {
    /// Entries added, by section and library.
    pub added: Vec<(SectionKind, String)>,
    /// Entries dropped, by section and library.
    pub removed: Vec<(SectionKind, String)>,
    /// The file text differs from what was read.
    pub changed: bool,
}

impl SpliceReport {
    pub fn added_libraries(&self) -> BTreeSet<&str> {
        self.added.iter().map(|(_, lib)| lib.as_str()).collect()
    }

    pub fn removed_libraries(&self) -> BTreeSet<&str> {
        self.removed.iter().map(|(_, lib)| lib.as_str()).collect()
    }
}

/// Splices a set of frameworks into project files.
#[derive(Debug, Clone)]
pub struct PbxprojSpliceEngine<'a> {
    kind: ProjectKind,
    /// Frameworks the build requires, in the order to add them.
    required: &'a [String],
    /// Every framework the SDK could have added.
    managed: &'a BTreeSet<String>,
    remove_unused: bool,
}

impl<'a> PbxprojSpliceEngine<'a> {
    pub fn new(kind: ProjectKind, required: &'a [String], managed: &'a BTreeSet<String>) -> Self {
        PbxprojSpliceEngine {
            kind,
            required,
            managed,
            remove_unused: false,
        }
    }

    /// Drop entries of managed frameworks the build no longer requires.
    ///
    /// Builds pass their clear-lib setting, so project references follow the
    /// files: a framework kept in `frameworks/` keeps its entries, and one the
    /// sync deletes loses them in the same run.
    pub fn with_remove_unused(mut self, remove_unused: bool) -> Self {
        self.remove_unused = remove_unused;
        self
    }

    /// Read, splice and (unless `dry_run`) write back one project file.
    ///
    /// An unchanged file is not rewritten.
    pub fn update_project(&self, path: &Path, dry_run: bool) -> Result<SpliceReport> {
        if !path.is_file() {
            return Err(PbxprojError::Missing {
                path: path.to_path_buf(),
            }
            .into());
        }

        let text = ace_fs::read_to_string(path)?;
        let (spliced, report) = self.splice(&text)?;

        if report.changed && !dry_run {
            ace_fs::write_atomic(path, &spliced)?;
            tracing::debug!("wrote {}", path.display());
        }
        Ok(report)
    }

    /// Splice `text`, returning the new text and what changed.
    pub fn splice(&self, text: &str) -> Result<(String, SpliceReport), PbxprojError> {
        let sections = self
            .kind
            .sections()
            .iter()
            .map(|kind| Section::locate(text, kind.anchors()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut ids = IdGenerator::new(text);
        let mut required: Vec<(&str, LibraryIds)> = Vec::new();
        for lib in self.required {
            if required.iter().any(|(name, _)| name == lib) {
                continue;
            }
            let lib_ids = recover_ids(&sections, lib, &mut ids);
            required.push((lib.as_str(), lib_ids));
        }

        let mut report = SpliceReport::default();
        let mut current = text.to_string();

        for kind in self.kind.sections() {
            let section = Section::locate(&current, kind.anchors())?;
            let stanzas = Stanza::for_section(*kind, self.kind);

            let mut additions = Vec::new();
            for (lib, lib_ids) in &required {
                for stanza in stanzas {
                    let present = section.entries_for(lib).any(|e| stanza.matches(e));
                    if !present {
                        additions.push(stanza.render(lib, lib_ids, self.kind));
                        report.added.push((*kind, lib.to_string()));
                    }
                }
            }

            let mut dropped = BTreeSet::new();
            for entry in &section.entries {
                if let Some(name) = &entry.name {
                    if self.is_stale(name) {
                        dropped.insert(name.clone());
                    }
                }
            }
            for name in &dropped {
                tracing::debug!("{}: removing unused {}", kind, name);
                report.removed.push((*kind, name.clone()));
            }

            if additions.is_empty() && dropped.is_empty() {
                continue;
            }
            current = section.rebuild(
                &current,
                |e| e.name.as_ref().map_or(true, |n| !dropped.contains(n)),
                &additions,
            );
        }

        report.changed = current != text;
        Ok((current, report))
    }

    fn is_stale(&self, name: &str) -> bool {
        self.remove_unused
            && self.managed.contains(name)
            && !self.required.iter().any(|r| r == name)
    }
}

/// Identifiers for `lib`, reusing any the file already has.
fn recover_ids(sections: &[Section], lib: &str, ids: &mut IdGenerator<'_>) -> LibraryIds {
    let find = |kind: SectionKind, marker: Option<&str>| -> Option<String> {
        sections
            .iter()
            .filter(|s| s.kind == kind)
            .flat_map(|s| s.entries_for(lib))
            .find(|e| marker.map_or(true, |m| e.line.contains(m)))
            .and_then(|e| e.identifier())
            .map(str::to_string)
    };

    let file_ref = find(SectionKind::FileReference, None)
        .or_else(|| find(SectionKind::FrameworksGroup, None));
    let build = find(SectionKind::BuildFile, Some(LINK_MARKER))
        .or_else(|| find(SectionKind::FrameworksBuildPhase, None));
    let embed = find(SectionKind::BuildFile, Some(EMBED_MARKER))
        .or_else(|| find(SectionKind::CopyFilesBuildPhase, None));

    LibraryIds {
        build: build.unwrap_or_else(|| ids.next_id()),
        embed: embed.unwrap_or_else(|| ids.next_id()),
        file_ref: file_ref.unwrap_or_else(|| ids.next_id()),
    }
}
