//! Locales a project declares, mapped to ICU locale names.
//!
//! Android projects list resource locales with `resConfigs` in each
//! sub-project's `build.gradle`; iOS projects list them as `knownRegions`
//! in the app project file. Both spellings differ from ICU's, so every
//! declared locale goes through a fixed table. A locale missing from the
//! table cannot be trimmed safely and forces the full data set.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::platform::{FileType, Platform};
use crate::core::project::Project;

static ANDROID_LANG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{2,3}$").unwrap());

static ANDROID_LANG_REGION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{2,3}-[rR][a-zA-Z]{2}$").unwrap());

static ANDROID_BCP47: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^b\+[a-zA-Z]{2,3}(\+[a-zA-Z0-9]{2,})*$").unwrap());

static KNOWN_REGIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"knownRegions\s*=\s*\(([^)]+)\)").unwrap());

/// Android resource qualifier (lowercased, `_`-separated) to ICU locale.
#[rustfmt::skip]
const ANDROID_LOCALES: &[(&str, &str)] = &[
    ("zh_cn", "zh_CN"), ("zh_hk", "zh_HK"), ("zh_tw", "zh_TW"), ("bo_cn", "bo_CN"),
    ("bo", "bo"), ("pt", "pt"), ("it", "it"), ("ru", "ru"), ("fr", "fr"), ("de", "de"),
    ("ar", "ar"), ("es", "es"), ("cs", "cs"), ("hr", "hr"), ("ja", "ja"), ("ko", "ko"),
    ("pl", "pl"), ("vi", "vi"), ("ms", "ms"), ("az_az", "az_AZ"), ("az", "az"),
    ("be", "be"), ("bg", "bg"), ("ca", "ca"), ("da", "da"), ("el", "el"),
    ("es_us", "es_US"), ("et", "et"), ("fa", "fa"), ("fi", "fi"), ("hi", "hi"),
    ("hu", "hu"), ("in", "in"), ("iw", "iw"), ("ka_ge", "ka_GE"), ("pt_pt", "pt_PT"),
    ("si_lk", "si_LK"), ("sk", "sk"), ("ka", "ka"), ("si", "si"), ("sl", "sl"),
    ("sv", "sv"), ("th", "th"), ("tur", "tr"), ("tr", "tr"), ("ur", "ur"),
    ("kk_kz", "kk_KZ"), ("kk", "kk"), ("nl", "nl"), ("sr_latn", "sr_Latn"), ("sr", "sr"),
    ("km_kh", "km_KH"), ("km", "km"), ("sw", "sw"), ("lv", "lv"), ("lo_la", "lo_LA"),
    ("lo", "lo"), ("lt", "lt"), ("ro", "ro"), ("mk", "mk"), ("mn", "mn"),
    ("my_zg", "my_ZG"), ("my_mm", "my_MM"), ("my", "my"), ("nb", "nb"), ("ne", "ne"),
    ("tl", "tl"), ("bn", "bn"), ("uk", "uk"), ("zz_zx", "zz_ZX"), ("zz", "zz"),
    ("en_gb", "en_GB"), ("eu", "eu"), ("bs", "bs"), ("gl", "gl"), ("jv_latn", "jv_Latn"),
    ("jv", "jv"), ("ml", "ml"), ("mr", "mr"), ("ta", "ta"), ("uz", "uz"), ("ug", "ug"),
    ("mai", "mai"), ("mi", "mi"), ("am", "am"), ("as", "as"), ("gu", "gu"), ("kn", "kn"),
    ("or", "or"), ("pa", "pa"), ("te", "te"), ("zh", "zh"), ("en", "en"),
    ("en_us", "en_US"), ("en_ca", "en_CA"),
];

/// Xcode region name to ICU locale.
#[rustfmt::skip]
const IOS_LOCALES: &[(&str, &str)] = &[
    ("zh-Hans", "zh_Hans"), ("zh-Hans-CN", "zh_Hans_CN"), ("zh-HK", "zh_HK"),
    ("zh-Hant", "zh_Hant"), ("ug-CN", "ug"), ("zh-Hant-HK", "zh_Hant_HK"),
    ("zh-Hant-TW", "zh_Hant_TW"), ("bo-CN", "bo_CN"), ("bo", "bo"), ("pt", "pt"),
    ("it", "it"), ("ru", "ru"), ("fr", "fr"), ("de", "de"), ("ar", "ar"), ("es", "es"),
    ("cs", "cs"), ("hr", "hr"), ("ja", "ja"), ("ko", "ko"), ("pl", "pl"), ("vi", "vi"),
    ("ms", "ms"), ("az-AZ", "az_AZ"), ("be", "be"), ("bg", "bg"), ("ca", "ca"),
    ("da", "da"), ("el", "el"), ("es-US", "es_US"), ("et", "et"), ("fa", "fa"),
    ("fi", "fi"), ("hi", "hi"), ("hu", "hu"), ("id", "in"), ("he", "iw"),
    ("ka-GE", "ka_GE"), ("pt-PT", "pt_PT"), ("si-LK", "si_LK"), ("sk", "sk"),
    ("sl", "sl"), ("sv", "sv"), ("th", "th"), ("tr", "tr"), ("ur", "ur"),
    ("kk-KZ", "kk_KZ"), ("nl", "nl"), ("sr-Latn", "sr_Latn"), ("km-KH", "km_KH"),
    ("sw", "sw"), ("lv", "lv"), ("lo-LA", "lo_LA"), ("lt", "lt"), ("ro", "ro"),
    ("mk", "mk"), ("mn", "mn"), ("my-MM", "my_MM"), ("nb", "nb"), ("ne", "ne"),
    ("fil", "tl"), ("bn", "bn"), ("uk", "uk"), ("zz-ZX", "zz_ZX"), ("en-GB", "en_GB"),
    ("eu", "eu"), ("bs", "bs"), ("gl", "gl"), ("jv-ID", "jv_Latn"), ("ml", "ml"),
    ("mr", "mr"), ("ta", "ta"), ("uz", "uz"), ("ug", "ug"), ("mai", "mai"), ("mi", "mi"),
    ("am", "am"), ("as", "as"), ("gu", "gu"), ("kn", "kn"), ("or", "or"), ("pa", "pa"),
    ("te", "te"), ("zh", "zh"), ("en", "en"), ("en-US", "en_US"), ("en-CA", "en_CA"),
];

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// The locales a project restricts itself to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleSelection {
    /// No restriction declared; every locale is needed.
    Unrestricted,
    /// Declared locales that have no ICU mapping.
    Unsupported(Vec<String>),
    /// ICU locales to keep, deduplicated in declaration order.
    Locales(Vec<String>),
}

impl LocaleSelection {
    /// Map declared locales through the platform table.
    pub fn from_declared(platform: Platform, declared: &[String]) -> Self {
        if declared.is_empty() {
            return LocaleSelection::Unrestricted;
        }

        let mut locales: Vec<String> = Vec::new();
        let mut unsupported = Vec::new();
        for item in declared {
            let mapped: Vec<&str> = if platform.is_ios() {
                ios_locale(item)
            } else {
                match android_key(item) {
                    Some(key) => lookup(ANDROID_LOCALES, &key).into_iter().collect(),
                    None => {
                        tracing::debug!("ignoring resource qualifier `{}`", item);
                        continue;
                    }
                }
            };

            if mapped.is_empty() {
                tracing::warn!("unsupported language: {}", item);
                unsupported.push(item.clone());
                continue;
            }
            for locale in mapped {
                if !locales.iter().any(|l| l == locale) {
                    locales.push(locale.to_string());
                }
            }
        }

        if !unsupported.is_empty() {
            LocaleSelection::Unsupported(unsupported)
        } else if locales.is_empty() {
            LocaleSelection::Unrestricted
        } else {
            LocaleSelection::Locales(locales)
        }
    }

    /// Read and map the locales the project declares for a build.
    pub fn for_project(project: &Project, platform: Platform, file_type: FileType) -> Self {
        let declared = if platform.is_ios() {
            ios_declared(project)
        } else {
            android_declared(project, file_type)
        };
        match declared {
            Some(declared) => Self::from_declared(platform, &declared),
            None => LocaleSelection::Unrestricted,
        }
    }
}

/// Normalise an Android resource qualifier to a table key.
///
/// `en`, `zh-rCN` and `b+sr+Latn` become `en`, `zh_cn` and `sr_latn`.
/// Qualifiers that are not locales (`car`, `xxhdpi`) yield `None`.
fn android_key(item: &str) -> Option<String> {
    let lower = item.to_lowercase();
    if ANDROID_LANG.is_match(item) && lower != "car" {
        Some(lower)
    } else if ANDROID_LANG_REGION.is_match(item) {
        Some(lower.replacen("-r", "_", 1))
    } else if ANDROID_BCP47.is_match(item) {
        Some(lower.replace('+', "_")[2..].to_string())
    } else {
        None
    }
}

fn ios_locale(item: &str) -> Vec<&'static str> {
    if item == "my-MM" {
        return vec!["my_MM", "my_ZG"];
    }
    lookup(IOS_LOCALES, item).into_iter().collect()
}

/// `resConfigs` entries of every sub-project. `None` when a sub-project has
/// no `build.gradle`.
fn android_declared(project: &Project, file_type: FileType) -> Option<Vec<String>> {
    let mut declared = Vec::new();
    for sub in project.sub_projects(file_type) {
        let text = std::fs::read_to_string(project.gradle_file(&sub)).ok()?;
        declared.extend(parse_res_configs(&text));
    }
    Some(declared)
}

fn parse_res_configs(gradle: &str) -> Vec<String> {
    let mut declared = Vec::new();
    for line in gradle.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("//") {
            continue;
        }
        if let Some(pos) = trimmed.find("resConfigs") {
            let list = format!("[{}]", &trimmed[pos + "resConfigs".len()..]);
            match serde_json::from_str::<Vec<String>>(&list) {
                Ok(items) => declared.extend(items),
                Err(e) => tracing::warn!("cannot read `{}`: {}", trimmed, e),
            }
        } else if let Some(pos) = trimmed.find("resConfig") {
            let item = trimmed[pos + "resConfig".len()..].replace('"', "");
            let item = item.trim();
            if !item.is_empty() {
                declared.push(item.to_string());
            }
        }
    }
    declared
}

/// `knownRegions` of the app project, without `Base`. `None` when the
/// project file is missing or declares only the template's `en` and `Base`.
fn ios_declared(project: &Project) -> Option<Vec<String>> {
    let text = std::fs::read_to_string(project.app_pbxproj()).ok()?;
    let Some(caps) = KNOWN_REGIONS.captures(&text) else {
        return Some(Vec::new());
    };
    let regions = parse_known_regions(&caps[1]);
    if regions.len() == 2 && regions.iter().any(|r| r == "en") && regions.iter().any(|r| r == "Base") {
        return None;
    }
    Some(regions.into_iter().filter(|r| r != "Base").collect())
}

fn parse_known_regions(list: &str) -> Vec<String> {
    list.split('\n')
        .map(|line| line.replace(['"', ';', ','], "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
