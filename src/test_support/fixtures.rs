//! On-disk fixtures: a small ArkUI-X SDK and a project generated for it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use crate::core::project::Project;
use crate::core::sdk::Sdk;

/// SDK architecture tokens libraries are written for.
pub const SDK_ARCH_TOKENS: [&str; 4] = [
    "android-arm64-release",
    "android-arm-release",
    "android-x86_64-release",
    "ios-release",
];

/// One module of the fixture SDK.
struct FixtureModule {
    /// Manifest directory, relative to the SDK root.
    dir: &'static str,
    module: &'static str,
    android: &'static [&'static str],
    ios: &'static [&'static str],
    deps: &'static [&'static str],
}

const MODULES: &[FixtureModule] = &[
    FixtureModule {
        dir: "engine",
        module: "engine/arkui",
        android: &["lib/{arch_type}/libarkui_android.so", "lib/arkui_android_adapter.jar"],
        ios: &["lib/{arch_type}/libarkui_ios.xcframework"],
        deps: &[],
    },
    FixtureModule {
        dir: "plugins/api",
        module: "plugin.i18n",
        android: &["i18n/{arch_type}/libi18n.so"],
        ios: &["i18n/{arch_type}/libi18n.xcframework"],
        deps: &[],
    },
    FixtureModule {
        dir: "plugins/api",
        module: "plugin.intl",
        android: &["intl/{arch_type}/libintl.so"],
        ios: &["intl/{arch_type}/libintl.xcframework"],
        deps: &[],
    },
    FixtureModule {
        dir: "plugins/api",
        module: "plugin.web",
        android: &["web/{arch_type}/libweb.so", "web/web_adapter.jar"],
        ios: &["web/{arch_type}/libweb.xcframework"],
        deps: &["plugin.bridge"],
    },
    FixtureModule {
        dir: "plugins/api",
        module: "plugin.bridge",
        android: &["bridge/{arch_type}/libbridge.so"],
        ios: &["bridge/{arch_type}/libbridge.xcframework"],
        deps: &[],
    },
    FixtureModule {
        dir: "plugins/component",
        module: "component.video",
        android: &["video/{arch_type}/libvideo.so"],
        ios: &["video/{arch_type}/libvideo.xcframework"],
        deps: &[],
    },
];

/// Builder for a fake SDK root.
#[derive(Debug, Clone)]
pub struct SdkFixture {
    root: PathBuf,
    version: String,
    icu_tool: bool,
    icu_data: bool,
    /// Library paths (relative to the SDK root) left out.
    missing: Vec<String>,
}

impl SdkFixture {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SdkFixture {
            root: root.into(),
            version: "5.1.0.60".to_string(),
            icu_tool: false,
            icu_data: true,
            missing: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Include the ICU filter tool.
    pub fn with_icu_tool(mut self) -> Self {
        self.icu_tool = true;
        self
    }

    pub fn without_icu_data(mut self) -> Self {
        self.icu_data = false;
        self
    }

    /// Leave out one library file, e.g. `plugins/api/web/android-arm64-release/libweb.so`.
    pub fn without_library(mut self, relative: &str) -> Self {
        self.missing.push(relative.to_string());
        self
    }

    pub fn write(self) -> Result<Sdk> {
        for dir in ["engine", "plugins/api", "plugins/component"] {
            let records: Vec<_> = MODULES
                .iter()
                .filter(|m| m.dir == dir)
                .map(|m| {
                    json!({
                        "module": m.module,
                        "library": {"android": m.android, "ios": m.ios},
                        "deps": {"android": m.deps, "ios": m.deps},
                    })
                })
                .collect();
            write(
                &self.root.join(dir).join("apiConfig.json"),
                &serde_json::to_string_pretty(&records)?,
            )?;
        }

        for m in MODULES {
            for template in m.android.iter().chain(m.ios.iter()) {
                for token in self.tokens_for(template) {
                    let relative = format!("{}/{}", m.dir, template.replace("{arch_type}", token));
                    if self.missing.contains(&relative) {
                        continue;
                    }
                    write_library(&self.root.join(&relative))?;
                }
            }
        }

        write(
            &self.root.join("arkui-x.json"),
            &json!({"apiVersion": "18", "version": self.version}).to_string(),
        )?;

        if self.icu_data {
            write(&self.root.join("engine/systemres/icudt74l.dat"), "full icu data")?;
        }

        if self.icu_tool {
            let tool = self.root.join("toolchains/bin/icudata_filter");
            write(&tool.join("filter_data.js"), "// filter\n")?;
            write(&tool.join("filter.json"), "[]")?;
            write(&tool.join("data/locales.txt"), "en\n")?;
            write(&tool.join("linux/icupkg"), "")?;
            write(&tool.join("mac/icupkg"), "")?;
            write(&tool.join("windows/icupkg.exe"), "")?;
        }

        Ok(Sdk::new(self.root))
    }

    fn tokens_for(&self, template: &str) -> Vec<&'static str> {
        if !template.contains("{arch_type}") {
            return vec![""];
        }
        let ios = template.ends_with(".xcframework");
        SDK_ARCH_TOKENS
            .iter()
            .copied()
            .filter(|t| t.starts_with("ios") == ios)
            .collect()
    }
}

/// Builder for a project with generated native sub-projects.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    root: PathBuf,
    modules: Vec<String>,
    api_version: Option<u32>,
    /// Write `compileSdkVersion` the way HarmonyOS projects do: `"5.1.0(18)"`.
    harmony_version: bool,
    abi_filters: Vec<String>,
    aar: Vec<String>,
    app: bool,
    res_configs: Option<String>,
    known_regions: Option<Vec<String>>,
    frameworks: Vec<String>,
}

impl ProjectFixture {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProjectFixture {
            root: root.into(),
            modules: Vec::new(),
            api_version: Some(18),
            harmony_version: false,
            abi_filters: vec!["arm64-v8a".to_string()],
            aar: Vec::new(),
            app: true,
            res_configs: None,
            known_regions: None,
            frameworks: Vec::new(),
        }
    }

    /// Modules the OpenHarmony build recorded as used.
    pub fn with_modules(mut self, modules: &[&str]) -> Self {
        self.modules = modules.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_api_version(mut self, api: Option<u32>) -> Self {
        self.api_version = api;
        self
    }

    pub fn with_harmony_version(mut self) -> Self {
        self.harmony_version = true;
        self
    }

    /// ABIs on the `abiFilters` line; empty writes no such line.
    pub fn with_abi_filters(mut self, abis: &[&str]) -> Self {
        self.abi_filters = abis.iter().map(|s| s.to_string()).collect();
        self
    }

    /// A library-only Android project with these modules.
    pub fn with_aar(mut self, names: &[&str]) -> Self {
        self.aar = names.iter().map(|s| s.to_string()).collect();
        self.app = false;
        self
    }

    /// A `resConfigs` line for every Android sub-project.
    pub fn with_res_configs(mut self, line: &str) -> Self {
        self.res_configs = Some(line.to_string());
        self
    }

    /// Replace the `knownRegions` of the app project.
    pub fn with_known_regions(mut self, regions: &[&str]) -> Self {
        self.known_regions = Some(regions.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Add an Xcode framework project.
    pub fn with_framework(mut self, name: &str) -> Self {
        self.frameworks.push(name.to_string());
        self
    }

    pub fn write(self) -> Result<Project> {
        let project = Project::new(&self.root);

        if !self.modules.is_empty() {
            write(
                &self
                    .root
                    .join("entry/build/default/cache/default/default@CompileArkTS/module_collection.json"),
                &json!({ "modules": self.modules }).to_string(),
            )?;
        }

        if let Some(api) = self.api_version {
            let (version, os) = if self.harmony_version {
                (format!("\"5.1.0({})\"", api), "HarmonyOS")
            } else {
                (api.to_string(), "OpenHarmony")
            };
            write(
                &self.root.join("build-profile.json5"),
                &format!(
                    "{{\n  \"app\": {{\n    \"products\": [\n      {{\n        \"name\": \"default\",\n        \"compileSdkVersion\": {},\n        \"runtimeOS\": \"{}\"\n      }}\n    ]\n  }}\n}}\n",
                    version, os
                ),
            )?;
        }

        let android = project.android_dir();
        let mut settings = String::new();
        let mut sub_projects = self.aar.clone();
        if self.app {
            sub_projects.insert(0, "app".to_string());
        }
        for name in &sub_projects {
            settings.push_str(&format!("include ':{}'\n", name));
            write(&project.gradle_file(name), &self.gradle_file())?;
        }
        write(&android.join("settings.gradle"), &settings)?;

        let mut pbxproj = APP_PBXPROJ.to_string();
        if let Some(regions) = &self.known_regions {
            let list: String = regions
                .iter()
                .map(|r| format!("\t\t\t\t{},\n", r))
                .collect();
            pbxproj = pbxproj.replace("\t\t\t\ten,\n\t\t\t\tBase,\n", &list);
        }
        write(&project.app_pbxproj(), &pbxproj)?;
        write(&project.podfile(), PODFILE)?;

        for name in &self.frameworks {
            write(
                &project
                    .ios_dir()
                    .join(format!("{}.xcodeproj", name))
                    .join("project.pbxproj"),
                APP_PBXPROJ,
            )?;
        }

        Ok(project)
    }

    fn gradle_file(&self) -> String {
        let mut config = String::new();
        if !self.abi_filters.is_empty() {
            let quoted: Vec<String> = self.abi_filters.iter().map(|a| format!("'{}'", a)).collect();
            config.push_str(&format!(
                "        ndk {{\n            abiFilters {}\n        }}\n",
                quoted.join(", ")
            ));
        }
        if let Some(line) = &self.res_configs {
            config.push_str(&format!("        {}\n", line));
        }
        format!(
            "plugins {{\n    id 'com.android.application'\n}}\n\nandroid {{\n    compileSdk 34\n\n    defaultConfig {{\n        minSdk 26\n{}    }}\n}}\n",
            config
        )
    }
}

fn write(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// A plain file, or a minimal bundle for `.xcframework` paths.
fn write_library(path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(".xcframework") {
        Some(stem) => {
            write(&path.join("Info.plist"), "<plist version=\"1.0\"/>\n")?;
            write(
                &path.join(format!("ios-arm64/{}.framework/{}", stem, stem)),
                &format!("binary {}", stem),
            )
        }
        None => write(path, &format!("binary {}", name)),
    }
}

/// Podfile of a generated app project.
pub const PODFILE: &str = "\
platform :ios, '10.0'

target 'app' do
  use_frameworks!
end
";

/// Project file of a generated app, linking the engine without embedding it.
pub const APP_PBXPROJ: &str = "\
// !$*UTF8*$!
{
\tarchiveVersion = 1;
\tclasses = {
\t};
\tobjectVersion = 54;
\tobjects = {

/* Begin PBXBuildFile section */
\t\t0F3A9C1E2B4D6F8091A2B302 /* AppDelegate.m in Sources */ = {isa = PBXBuildFile; fileRef = 0F3A9C1E2B4D6F8091A2B301 /* AppDelegate.m */; };
\t\t0F3A9C1E2B4D6F8091A2B304 /* main.m in Sources */ = {isa = PBXBuildFile; fileRef = 0F3A9C1E2B4D6F8091A2B303 /* main.m */; };
\t\t0F3A9C1E2B4D6F8091A2B306 /* libarkui_ios.xcframework in Frameworks */ = {isa = PBXBuildFile; fileRef = 0F3A9C1E2B4D6F8091A2B305 /* libarkui_ios.xcframework */; };
\t\t0F3A9C1E2B4D6F8091A2B309 /* arkui-x in Resources */ = {isa = PBXBuildFile; fileRef = 0F3A9C1E2B4D6F8091A2B308 /* arkui-x */; };
/* End PBXBuildFile section */

/* Begin PBXCopyFilesBuildPhase section */
\t\t0F3A9C1E2B4D6F8091A2B318 /* Embed Frameworks */ = {
\t\t\tisa = PBXCopyFilesBuildPhase;
\t\t\tbuildActionMask = 2147483647;
\t\t\tdstPath = \"\";
\t\t\tdstSubfolderSpec = 10;
\t\t\tfiles = (
\t\t\t);
\t\t\tname = \"Embed Frameworks\";
\t\t\trunOnlyForDeploymentPostprocessing = 0;
\t\t};
/* End PBXCopyFilesBuildPhase section */

/* Begin PBXFileReference section */
\t\t0F3A9C1E2B4D6F8091A2B301 /* AppDelegate.m */ = {isa = PBXFileReference; lastKnownFileType = sourcecode.c.objc; path = AppDelegate.m; sourceTree = \"<group>\"; };
\t\t0F3A9C1E2B4D6F8091A2B303 /* main.m */ = {isa = PBXFileReference; lastKnownFileType = sourcecode.c.objc; path = main.m; sourceTree = \"<group>\"; };
\t\t0F3A9C1E2B4D6F8091A2B305 /* libarkui_ios.xcframework */ = {isa = PBXFileReference; lastKnownFileType = wrapper.xcframework; name = libarkui_ios.xcframework; path = frameworks/libarkui_ios.xcframework; sourceTree = \"<group>\"; };
\t\t0F3A9C1E2B4D6F8091A2B307 /* app.app */ = {isa = PBXFileReference; explicitFileType = wrapper.application; includeInIndex = 0; path = app.app; sourceTree = BUILT_PRODUCTS_DIR; };
\t\t0F3A9C1E2B4D6F8091A2B308 /* arkui-x */ = {isa = PBXFileReference; lastKnownFileType = folder; path = \"arkui-x\"; sourceTree = \"<group>\"; };
/* End PBXFileReference section */

/* Begin PBXFrameworksBuildPhase section */
\t\t0F3A9C1E2B4D6F8091A2B316 /* Frameworks */ = {
\t\t\tisa = PBXFrameworksBuildPhase;
\t\t\tbuildActionMask = 2147483647;
\t\t\tfiles = (
\t\t\t\t0F3A9C1E2B4D6F8091A2B306 /* libarkui_ios.xcframework in Frameworks */,
\t\t\t);
\t\t\trunOnlyForDeploymentPostprocessing = 0;
\t\t};
/* End PBXFrameworksBuildPhase section */

/* Begin PBXGroup section */
\t\t0F3A9C1E2B4D6F8091A2B310 = {
\t\t\tisa = PBXGroup;
\t\t\tchildren = (
\t\t\t\t0F3A9C1E2B4D6F8091A2B313 /* app */,
\t\t\t\t0F3A9C1E2B4D6F8091A2B308 /* arkui-x */,
\t\t\t\t0F3A9C1E2B4D6F8091A2B311 /* Products */,
\t\t\t\t0F3A9C1E2B4D6F8091A2B312 /* Frameworks */,
\t\t\t);
\t\t\tsourceTree = \"<group>\";
\t\t};
\t\t0F3A9C1E2B4D6F8091A2B311 /* Products */ = {
\t\t\tisa = PBXGroup;
\t\t\tchildren = (
\t\t\t\t0F3A9C1E2B4D6F8091A2B307 /* app.app */,
\t\t\t);
\t\t\tname = Products;
\t\t\tsourceTree = \"<group>\";
\t\t};
\t\t0F3A9C1E2B4D6F8091A2B312 /* Frameworks */ = {
\t\t\tisa = PBXGroup;
\t\t\tchildren = (
\t\t\t\t0F3A9C1E2B4D6F8091A2B305 /* libarkui_ios.xcframework */,
\t\t\t);
\t\t\tname = Frameworks;
\t\t\tsourceTree = \"<group>\";
\t\t};
\t\t0F3A9C1E2B4D6F8091A2B313 /* app */ = {
\t\t\tisa = PBXGroup;
\t\t\tchildren = (
\t\t\t\t0F3A9C1E2B4D6F8091A2B301 /* AppDelegate.m */,
\t\t\t\t0F3A9C1E2B4D6F8091A2B303 /* main.m */,
\t\t\t);
\t\t\tpath = app;
\t\t\tsourceTree = \"<group>\";
\t\t};
/* End PBXGroup section */

/* Begin PBXNativeTarget section */
\t\t0F3A9C1E2B4D6F8091A2B314 /* app */ = {
\t\t\tisa = PBXNativeTarget;
\t\t\tbuildConfigurationList = 0F3A9C1E2B4D6F8091A2B321 /* Build configuration list for PBXNativeTarget \"app\" */;
\t\t\tbuildPhases = (
\t\t\t\t0F3A9C1E2B4D6F8091A2B315 /* Sources */,
\t\t\t\t0F3A9C1E2B4D6F8091A2B316 /* Frameworks */,
\t\t\t\t0F3A9C1E2B4D6F8091A2B317 /* Resources */,
\t\t\t\t0F3A9C1E2B4D6F8091A2B318 /* Embed Frameworks */,
\t\t\t);
\t\t\tname = app;
\t\t\tproductName = app;
\t\t\tproductReference = 0F3A9C1E2B4D6F8091A2B307 /* app.app */;
\t\t\tproductType = \"com.apple.product-type.application\";
\t\t};
/* End PBXNativeTarget section */

/* Begin PBXProject section */
\t\t0F3A9C1E2B4D6F8091A2B319 /* Project object */ = {
\t\t\tisa = PBXProject;
\t\t\tbuildConfigurationList = 0F3A9C1E2B4D6F8091A2B320 /* Build configuration list for PBXProject \"app\" */;
\t\t\tcompatibilityVersion = \"Xcode 9.3\";
\t\t\tdevelopmentRegion = en;
\t\t\thasScannedForEncodings = 0;
\t\t\tknownRegions = (
\t\t\t\ten,
\t\t\t\tBase,
\t\t\t);
\t\t\tmainGroup = 0F3A9C1E2B4D6F8091A2B310;
\t\t\tproductRefGroup = 0F3A9C1E2B4D6F8091A2B311 /* Products */;
\t\t\tprojectDirPath = \"\";
\t\t\tprojectRoot = \"\";
\t\t\ttargets = (
\t\t\t\t0F3A9C1E2B4D6F8091A2B314 /* app */,
\t\t\t);
\t\t};
/* End PBXProject section */

/* Begin PBXResourcesBuildPhase section */
\t\t0F3A9C1E2B4D6F8091A2B317 /* Resources */ = {
\t\t\tisa = PBXResourcesBuildPhase;
\t\t\tbuildActionMask = 2147483647;
\t\t\tfiles = (
\t\t\t\t0F3A9C1E2B4D6F8091A2B309 /* arkui-x in Resources */,
\t\t\t);
\t\t\trunOnlyForDeploymentPostprocessing = 0;
\t\t};
/* End PBXResourcesBuildPhase section */

/* Begin PBXSourcesBuildPhase section */
\t\t0F3A9C1E2B4D6F8091A2B315 /* Sources */ = {
\t\t\tisa = PBXSourcesBuildPhase;
\t\t\tbuildActionMask = 2147483647;
\t\t\tfiles = (
\t\t\t\t0F3A9C1E2B4D6F8091A2B304 /* main.m in Sources */,
\t\t\t\t0F3A9C1E2B4D6F8091A2B302 /* AppDelegate.m in Sources */,
\t\t\t);
\t\t\trunOnlyForDeploymentPostprocessing = 0;
\t\t};
/* End PBXSourcesBuildPhase section */
\t};
\trootObject = 0F3A9C1E2B4D6F8091A2B319 /* Project object */;
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::ManifestStore;
    use tempfile::TempDir;

    #[test]
    fn test_sdk_fixture_is_loadable() {
        let tmp = TempDir::new().unwrap();
        let sdk = SdkFixture::new(tmp.path()).write().unwrap();
        let store = ManifestStore::load_sdk(sdk.root()).unwrap();
        assert_eq!(store.len(), MODULES.len());
        assert!(sdk
            .root()
            .join("engine/lib/android-arm64-release/libarkui_android.so")
            .is_file());
        assert!(sdk
            .root()
            .join("engine/lib/ios-release/libarkui_ios.xcframework/Info.plist")
            .is_file());
        assert!(sdk.root().join("engine/lib/arkui_android_adapter.jar").is_file());
        assert_eq!(sdk.version().unwrap().to_string(), "5.1.0.60");
    }

    #[test]
    fn test_project_fixture_layout() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new(tmp.path())
            .with_modules(&["plugin.web"])
            .write()
            .unwrap();
        assert!(project.is_app_project());
        assert_eq!(project.sdk_api_version(), Some(18));
        assert_eq!(project.cpu_list("app", crate::core::Platform::Android, &[]), ["arm64-v8a"]);
        assert_eq!(project.xcode_projects().unwrap(), ["app"]);
    }

    #[test]
    fn test_harmony_project_fixture_api_version() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new(tmp.path())
            .with_harmony_version()
            .write()
            .unwrap();
        let profile = std::fs::read_to_string(tmp.path().join("build-profile.json5")).unwrap();
        assert!(profile.contains("\"compileSdkVersion\": \"5.1.0(18)\""));
        assert_eq!(project.sdk_api_version(), Some(18));
    }
}
