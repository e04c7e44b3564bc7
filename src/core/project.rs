//! The cross-platform project being packaged.
//!
//! Native sub-projects live under `.arkui-x/`: Gradle projects under
//! `.arkui-x/android`, Xcode projects under `.arkui-x/ios`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::core::platform::{FileType, Platform};

static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

static GRADLE_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"include\s*\(?\s*['"]:([^'"]+)['"]"#).unwrap());

/// `compileSdkVersion: 18` or `compileSdkVersion: '5.1.0(18)'`, either quote style.
static COMPILE_SDK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?compileSdkVersion["']?\s*:\s*(?:["']([^"']*)["']|(\d+))"#).unwrap()
});

static API_IN_PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d+)\)").unwrap());

/// Directory holding the generated native projects.
pub const NATIVE_DIR: &str = ".arkui-x";

/// A project on disk.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Project { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn native_dir(&self) -> PathBuf {
        self.root.join(NATIVE_DIR)
    }

    pub fn android_dir(&self) -> PathBuf {
        self.native_dir().join("android")
    }

    pub fn ios_dir(&self) -> PathBuf {
        self.native_dir().join("ios")
    }

    /// The app target's Xcode project file.
    pub fn app_pbxproj(&self) -> PathBuf {
        self.ios_dir().join("app.xcodeproj").join("project.pbxproj")
    }

    pub fn podfile(&self) -> PathBuf {
        self.ios_dir().join("Podfile")
    }

    /// Sub-project directory names that receive libraries for a file type.
    pub fn sub_projects(&self, file_type: FileType) -> Vec<String> {
        match file_type {
            FileType::Apk => vec!["app".to_string()],
            FileType::Aar => self.aar_names(),
            FileType::Ios | FileType::IosFramework | FileType::IosXcframework => {
                vec!["ios".to_string()]
            }
        }
    }

    /// Library modules included by `settings.gradle`, excluding `:app`.
    pub fn aar_names(&self) -> Vec<String> {
        let Some(settings) = self.read_settings_gradle() else {
            return Vec::new();
        };
        settings
            .lines()
            .filter_map(|line| GRADLE_INCLUDE.captures(line))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .filter(|name| name != "app")
            .collect()
    }

    /// Whether the Android project builds an application (`include ':app'`).
    pub fn is_app_project(&self) -> bool {
        self.read_settings_gradle()
            .map(|s| {
                s.lines()
                    .filter_map(|line| GRADLE_INCLUDE.captures(line))
                    .any(|caps| caps.get(1).is_some_and(|m| m.as_str() == "app"))
            })
            .unwrap_or(false)
    }

    fn read_settings_gradle(&self) -> Option<String> {
        std::fs::read_to_string(self.android_dir().join("settings.gradle")).ok()
    }

    /// The `build.gradle` of an Android sub-project.
    pub fn gradle_file(&self, sub_project: &str) -> PathBuf {
        self.android_dir().join(sub_project).join("build.gradle")
    }

    /// Project ABIs for one sub-project.
    ///
    /// Android reads the `abiFilters` line of the sub-project's `build.gradle`
    /// and falls back to `target_platforms` (`arm64`, `arm`, `x86_64`) when
    /// the line is missing. iOS always builds `arm64`.
    pub fn cpu_list(
        &self,
        sub_project: &str,
        platform: Platform,
        target_platforms: &[String],
    ) -> Vec<String> {
        if platform.is_ios() {
            return vec!["arm64".to_string()];
        }

        if let Ok(gradle) = std::fs::read_to_string(self.gradle_file(sub_project)) {
            if let Some(line) = gradle
                .lines()
                .find(|l| l.contains("abiFilters") && !l.trim_start().starts_with("//"))
            {
                let abis: Vec<String> = QUOTED
                    .captures_iter(line)
                    .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                    .collect();
                if !abis.is_empty() {
                    return abis;
                }
            }
        } else {
            tracing::warn!(
                "no build.gradle for android sub-project `{}`, using target platforms",
                sub_project
            );
        }

        abis_from_target_platforms(target_platforms)
    }

    /// Xcode project names (without `.xcodeproj`) under `.arkui-x/ios`.
    pub fn xcode_projects(&self) -> Result<Vec<String>> {
        let dir = self.ios_dir();
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("failed to read directory: {}", dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stem) = name.strip_suffix(".xcodeproj") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Project files to splice for a file type.
    pub fn pbxproj_files(&self, file_type: FileType) -> Result<Vec<PathBuf>> {
        if file_type.is_framework() {
            Ok(self
                .xcode_projects()?
                .into_iter()
                .map(|name| {
                    self.ios_dir()
                        .join(format!("{}.xcodeproj", name))
                        .join("project.pbxproj")
                })
                .collect())
        } else {
            Ok(vec![self.app_pbxproj()])
        }
    }

    /// API level from `build-profile.json5` (`compileSdkVersion`), if present.
    pub fn sdk_api_version(&self) -> Option<u32> {
        let text = std::fs::read_to_string(self.root.join("build-profile.json5")).ok()?;
        let caps = COMPILE_SDK.captures(&text)?;
        if let Some(number) = caps.get(2) {
            return number.as_str().parse().ok();
        }
        parse_api_level(caps.get(1)?.as_str())
    }
}

/// API level of a quoted `compileSdkVersion`: the number in parentheses of a
/// HarmonyOS version (`5.1.0(18)`), else the whole value.
fn parse_api_level(value: &str) -> Option<u32> {
    match API_IN_PARENS.captures(value) {
        Some(caps) => caps.get(1)?.as_str().parse().ok(),
        None => value.trim().parse().ok(),
    }
}

/// Map `--target-platform` names to Android ABIs. Unknown names are ignored.
pub fn abis_from_target_platforms(target_platforms: &[String]) -> Vec<String> {
    if target_platforms.is_empty() {
        return vec!["arm64-v8a".to_string()];
    }
    target_platforms
        .iter()
        .filter_map(|p| match p.trim() {
            "arm64" => Some("arm64-v8a"),
            "arm" => Some("armeabi-v7a"),
            "x86_64" => Some("x86_64"),
            _ => None,
        })
        .map(str::to_string)
        .collect()
}
