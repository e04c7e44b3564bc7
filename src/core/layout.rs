//! Architecture and destination tables for native libraries.
//!
//! These tables describe where SDK artifacts come from and where they go in
//! the generated native projects. They change only when the SDK directory
//! layout or the project templates change, so they are versioned constants
//! rather than user configuration.

use std::path::{Path, PathBuf};

use crate::core::platform::{BuildProfile, Platform};

/// Bumped whenever a table below changes shape or content.
pub const LAYOUT_VERSION: u32 = 3;

/// Placeholder in destination templates replaced by the sub-project name.
pub const SUBDIR_PLACEHOLDER: &str = "{subdir}";

/// Architecture tokens per (platform, project ABI, profile). The first token is used.
#[derive(Debug, Clone, Copy)]
pub struct ArchTokens {
    pub platform: &'static str,
    pub cpu: &'static str,
    pub debug: &'static [&'static str],
    pub release: &'static [&'static str],
    pub profile: &'static [&'static str],
}

/// Destination directory per (platform, project ABI, file extension).
#[derive(Debug, Clone, Copy)]
pub struct DestinationBucket {
    pub platform: &'static str,
    pub cpu: &'static str,
    pub extension: &'static str,
    pub template: &'static str,
}

// Current SDK layout: Android engines ship release builds only
// (`android-<abi>-release`, armeabi-v7a and x86_64 keeping their older
// unsuffixed directories as a fallback) and iOS ships one universal
// `ios-release` xcframework set for devices and simulators. Older SDKs with
// per-profile `android-arm64`/`ios-arm64`/`ios-arm64-simulator` directories
// are not supported.
const ARCH_TOKENS: &[ArchTokens] = &[
    ArchTokens {
        platform: "android",
        cpu: "arm64-v8a",
        debug: &["android-arm64-release"],
        release: &["android-arm64-release"],
        profile: &["android-arm64-release"],
    },
    ArchTokens {
        platform: "android",
        cpu: "armeabi-v7a",
        debug: &["android-arm-release"],
        release: &["android-arm-release", "android-arm"],
        profile: &["android-arm-release", "android-arm"],
    },
    ArchTokens {
        platform: "android",
        cpu: "x86_64",
        debug: &["android-x86_64-release"],
        release: &["android-x86_64-release", "android-x86_64"],
        profile: &["android-x86_64-release", "android-x86_64"],
    },
    ArchTokens {
        platform: "ios",
        cpu: "arm64",
        debug: &["ios-release"],
        release: &["ios-release"],
        profile: &["ios-release"],
    },
    ArchTokens {
        platform: "ios-simulator",
        cpu: "arm64",
        debug: &["ios-release"],
        release: &["ios-release"],
        profile: &["ios-release"],
    },
    ArchTokens {
        platform: "ios-simulator",
        cpu: "x86_64",
        debug: &["ios-release"],
        release: &["ios-release"],
        profile: &["ios-release"],
    },
];

const DESTINATIONS: &[DestinationBucket] = &[
    DestinationBucket {
        platform: "android",
        cpu: "arm64-v8a",
        extension: "so",
        template: ".arkui-x/android/{subdir}/libs/arm64-v8a",
    },
    DestinationBucket {
        platform: "android",
        cpu: "arm64-v8a",
        extension: "jar",
        template: ".arkui-x/android/{subdir}/libs",
    },
    DestinationBucket {
        platform: "android",
        cpu: "armeabi-v7a",
        extension: "so",
        template: ".arkui-x/android/{subdir}/libs/armeabi-v7a",
    },
    DestinationBucket {
        platform: "android",
        cpu: "armeabi-v7a",
        extension: "jar",
        template: ".arkui-x/android/{subdir}/libs",
    },
    DestinationBucket {
        platform: "android",
        cpu: "x86_64",
        extension: "so",
        template: ".arkui-x/android/{subdir}/libs/x86_64",
    },
    DestinationBucket {
        platform: "android",
        cpu: "x86_64",
        extension: "jar",
        template: ".arkui-x/android/{subdir}/libs",
    },
    DestinationBucket {
        platform: "ios",
        cpu: "arm64",
        extension: "xcframework",
        template: ".arkui-x/{subdir}/frameworks",
    },
    DestinationBucket {
        platform: "ios",
        cpu: "x86_64",
        extension: "xcframework",
        template: ".arkui-x/{subdir}/frameworks",
    },
    DestinationBucket {
        platform: "ios-simulator",
        cpu: "arm64",
        extension: "xcframework",
        template: ".arkui-x/{subdir}/frameworks",
    },
    DestinationBucket {
        platform: "ios-simulator",
        cpu: "x86_64",
        extension: "xcframework",
        template: ".arkui-x/{subdir}/frameworks",
    },
];

/// Destination directories for one architecture of one sub-project, by extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationMap {
    buckets: Vec<(String, PathBuf)>,
}

impl DestinationMap {
    /// Build a map from explicit `(extension, directory)` pairs.
    pub fn from_pairs<I, E, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (E, P)>,
        E: Into<String>,
        P: Into<PathBuf>,
    {
        DestinationMap {
            buckets: pairs
                .into_iter()
                .map(|(e, p)| (e.into(), p.into()))
                .collect(),
        }
    }

    /// The directory a file with this extension belongs in.
    pub fn for_extension(&self, extension: &str) -> Option<&Path> {
        self.buckets
            .iter()
            .find(|(ext, _)| ext == extension)
            .map(|(_, dir)| dir.as_path())
    }

    /// Every configured directory, without duplicates.
    pub fn directories(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = Vec::new();
        for (_, dir) in &self.buckets {
            if !dirs.contains(&dir.as_path()) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// Configured extensions, for error messages.
    pub fn extensions(&self) -> Vec<&str> {
        self.buckets.iter().map(|(e, _)| e.as_str()).collect()
    }
}

/// Lookup over the static tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryLayout;

impl LibraryLayout {
    /// The SDK architecture token for a project ABI and profile.
    pub fn arch_token(
        &self,
        platform: Platform,
        cpu: &str,
        profile: BuildProfile,
    ) -> Option<&'static str> {
        let row = ARCH_TOKENS
            .iter()
            .find(|r| r.platform == platform.as_str() && r.cpu == cpu)?;
        let tokens = match profile {
            BuildProfile::Debug => row.debug,
            BuildProfile::Release => row.release,
            BuildProfile::Profile => row.profile,
        };
        tokens.first().copied()
    }

    /// Destination directories for a project ABI, resolved against a project
    /// root and sub-project name.
    pub fn destinations(
        &self,
        platform: Platform,
        cpu: &str,
        project_dir: &Path,
        subdir: &str,
    ) -> DestinationMap {
        DestinationMap::from_pairs(
            DESTINATIONS
                .iter()
                .filter(|b| b.platform == platform.as_str() && b.cpu == cpu)
                .map(|b| {
                    (
                        b.extension,
                        project_dir.join(b.template.replace(SUBDIR_PLACEHOLDER, subdir)),
                    )
                }),
        )
    }

    /// Project ABIs the layout knows for a platform.
    pub fn known_cpus(&self, platform: Platform) -> Vec<&'static str> {
        ARCH_TOKENS
            .iter()
            .filter(|r| r.platform == platform.as_str())
            .map(|r| r.cpu)
            .collect()
    }
}
