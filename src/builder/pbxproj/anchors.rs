//! Anchor strings locating the sections of an Xcode project file.
//!
//! Xcode writes these markers itself and has kept them stable for many
//! releases. When a new Xcode changes one, update the table and bump
//! [`ANCHOR_TABLE_VERSION`].

use std::fmt;

/// Bumped whenever [`SECTIONS`] changes.
pub const ANCHOR_TABLE_VERSION: u32 = 1;

/// The five sections a library is spliced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    /// `PBXBuildFile` objects.
    BuildFile,
    /// File list of the `Embed Frameworks` copy phase.
    CopyFilesBuildPhase,
    /// `PBXFileReference` objects.
    FileReference,
    /// File list of the frameworks link phase.
    FrameworksBuildPhase,
    /// Children of the `Frameworks` group.
    FrameworksGroup,
}

impl SectionKind {
    pub fn anchors(self) -> &'static SectionAnchors {
        match self {
            SectionKind::BuildFile => &SECTIONS[0],
            SectionKind::CopyFilesBuildPhase => &SECTIONS[1],
            SectionKind::FileReference => &SECTIONS[2],
            SectionKind::FrameworksBuildPhase => &SECTIONS[3],
            SectionKind::FrameworksGroup => &SECTIONS[4],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::BuildFile => "PBXBuildFile",
            SectionKind::CopyFilesBuildPhase => "PBXCopyFilesBuildPhase",
            SectionKind::FileReference => "PBXFileReference",
            SectionKind::FrameworksBuildPhase => "PBXFrameworksBuildPhase",
            SectionKind::FrameworksGroup => "PBXGroup",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delimiters around the library name inside an entry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameDelimiters {
    pub open: &'static str,
    pub close: &'static str,
}

/// Names used by build-file and phase entries: `ID /* name in Frameworks */`.
pub const USAGE_NAME: NameDelimiters = NameDelimiters {
    open: "/* ",
    close: " in ",
};

/// Names used by file references and group children: `ID /* name */`.
pub const REFERENCE_NAME: NameDelimiters = NameDelimiters {
    open: "/* ",
    close: " */",
};

/// How to find one section.
#[derive(Debug, Clone, Copy)]
pub struct SectionAnchors {
    pub kind: SectionKind,
    /// Markers found in order. The first is searched from the end of the
    /// file, each later one forward from the previous.
    pub chain: &'static [&'static str],
    /// Marker closing the section, searched forward from the chain.
    pub end: &'static str,
    pub name: NameDelimiters,
}

impl SectionAnchors {
    /// The chain rendered for error messages, `"a" >> "b"`.
    pub fn describe_chain(&self, upto: usize) -> String {
        self.chain[..upto.min(self.chain.len())]
            .iter()
            .map(|a| format!("\"{}\"", a))
            .collect::<Vec<_>>()
            .join(" >> ")
    }
}

pub const SECTIONS: [SectionAnchors; 5] = [
    SectionAnchors {
        kind: SectionKind::BuildFile,
        chain: &["/* Begin PBXBuildFile section */"],
        end: "/* End PBXBuildFile section */",
        name: USAGE_NAME,
    },
    SectionAnchors {
        kind: SectionKind::CopyFilesBuildPhase,
        chain: &["/* Begin PBXCopyFilesBuildPhase section */", "files = ("],
        end: ");",
        name: USAGE_NAME,
    },
    SectionAnchors {
        kind: SectionKind::FileReference,
        chain: &["/* Begin PBXFileReference section */"],
        end: "/* End PBXFileReference section */",
        name: REFERENCE_NAME,
    },
    SectionAnchors {
        kind: SectionKind::FrameworksBuildPhase,
        chain: &["/* Begin PBXFrameworksBuildPhase section */", "files = ("],
        end: ");",
        name: USAGE_NAME,
    },
    SectionAnchors {
        kind: SectionKind::FrameworksGroup,
        chain: &[
            "/* Begin PBXGroup section */",
            "/* Frameworks */ = {",
            "children = (",
        ],
        end: ");",
        name: REFERENCE_NAME,
    },
];
