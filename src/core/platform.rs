//! Target platforms, build profiles and output file types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A target system for a native build.
///
/// `IosSimulator` shares the `ios` library lists of the SDK manifests but
/// selects its own architecture tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Android,
    Ios,
    IosSimulator,
}

impl Platform {
    /// The key used in SDK manifests (`library.<key>`, `deps.<key>`).
    pub fn manifest_key(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios | Platform::IosSimulator => "ios",
        }
    }

    /// The key used in the architecture layout tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::IosSimulator => "ios-simulator",
        }
    }

    /// Whether this platform produces an Xcode project.
    pub fn is_ios(&self) -> bool {
        matches!(self, Platform::Ios | Platform::IosSimulator)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            "ios-simulator" => Ok(Platform::IosSimulator),
            _ => Err(format!(
                "unknown platform '{}'; expected 'android', 'ios' or 'ios-simulator'",
                s
            )),
        }
    }
}

/// Build variant substituted for the `build_modes` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    Debug,
    #[default]
    Release,
    Profile,
}

impl BuildProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildProfile::Debug => "debug",
            BuildProfile::Release => "release",
            BuildProfile::Profile => "profile",
        }
    }

    /// Select the profile from CLI flags. Debug wins over profile; release is the default.
    pub fn from_flags(debug: bool, profile: bool) -> Self {
        if debug {
            BuildProfile::Debug
        } else if profile {
            BuildProfile::Profile
        } else {
            BuildProfile::Release
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of artifact the surrounding build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Apk,
    Aar,
    Ios,
    IosFramework,
    IosXcframework,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Apk => "apk",
            FileType::Aar => "aar",
            FileType::Ios => "ios",
            FileType::IosFramework => "ios-framework",
            FileType::IosXcframework => "ios-xcframework",
        }
    }

    /// The platform this file type is built for.
    pub fn platform(&self, simulator: bool) -> Platform {
        match self {
            FileType::Apk | FileType::Aar => Platform::Android,
            _ if simulator => Platform::IosSimulator,
            _ => Platform::Ios,
        }
    }

    /// Whether the Xcode project is a framework project rather than an app.
    pub fn is_framework(&self) -> bool {
        matches!(self, FileType::IosFramework | FileType::IosXcframework)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apk" => Ok(FileType::Apk),
            "aar" => Ok(FileType::Aar),
            "ios" | "app" => Ok(FileType::Ios),
            "ios-framework" | "framework" => Ok(FileType::IosFramework),
            "ios-xcframework" | "xcframework" => Ok(FileType::IosXcframework),
            _ => Err(format!(
                "unknown file type '{}'; expected one of: apk, aar, ios, ios-framework, ios-xcframework",
                s
            )),
        }
    }
}
