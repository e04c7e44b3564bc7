//! The ArkUI-X SDK on disk.
//!
//! An SDK root (the `arkui-x` directory) holds `engine/`, `plugins/api/`
//! and `plugins/component/`, each with an `apiConfig.json` manifest, plus
//! `arkui-x.json` carrying the SDK version and `toolchains/` with helper
//! tools. Installed SDKs are usually laid out as `<sdk-home>/<api>/arkui-x`.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::core::manifest::ManifestSource;

static ICU_DATA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^icudt(\d+)l\.dat$").unwrap());

/// Directory name of an SDK root inside an SDK home.
pub const SDK_DIR_NAME: &str = "arkui-x";

/// A located SDK root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sdk {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SdkInfo {
    version: String,
}

impl Sdk {
    /// Wrap a directory already known to be an SDK root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Sdk { root: root.into() }
    }

    /// Find the SDK root for `path`.
    ///
    /// `path` may be the root itself, a directory holding `arkui-x/`, or an
    /// SDK home holding `<api>/arkui-x`. With no `api_version` the highest
    /// installed API level is used.
    pub fn locate(path: &Path, api_version: Option<u32>) -> Result<Self> {
        if is_sdk_root(path) {
            return Ok(Sdk::new(path));
        }
        if is_sdk_root(&path.join(SDK_DIR_NAME)) {
            return Ok(Sdk::new(path.join(SDK_DIR_NAME)));
        }

        if let Some(api) = api_version {
            let candidate = path.join(api.to_string()).join(SDK_DIR_NAME);
            if is_sdk_root(&candidate) {
                return Ok(Sdk::new(candidate));
            }
            bail!(
                "no ArkUI-X SDK for API {} under {}",
                api,
                path.display()
            );
        }

        let mut installed: Vec<(u32, PathBuf)> = std::fs::read_dir(path)
            .with_context(|| format!("failed to read SDK directory: {}", path.display()))?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let api: u32 = e.file_name().to_str()?.parse().ok()?;
                let root = e.path().join(SDK_DIR_NAME);
                is_sdk_root(&root).then_some((api, root))
            })
            .collect();
        installed.sort();

        match installed.pop() {
            Some((api, root)) => {
                tracing::debug!("using SDK for API {} at {}", api, root.display());
                Ok(Sdk::new(root))
            }
            None => bail!("no ArkUI-X SDK found under {}", path.display()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn engine_dir(&self) -> PathBuf {
        self.root.join("engine")
    }

    /// The three manifest documents, in load order.
    pub fn manifests(&self) -> Vec<ManifestSource> {
        ManifestSource::sdk_defaults(&self.root)
    }

    /// Where the CocoaPods spec for the SDK is written.
    pub fn podspec_path(&self) -> PathBuf {
        self.root.join("arkui-x.podspec")
    }

    pub fn systemres_dir(&self) -> PathBuf {
        self.engine_dir().join("systemres")
    }

    /// The ICU data blob shipped with the engine (`icudt<N>l.dat`).
    pub fn icu_data_file(&self) -> Option<PathBuf> {
        let mut found: Vec<PathBuf> = std::fs::read_dir(self.systemres_dir())
            .ok()?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| ICU_DATA.is_match(&e.file_name().to_string_lossy()))
            .map(|e| e.path())
            .collect();
        found.sort();
        found.into_iter().next()
    }

    /// The ICU data filter tool directory.
    pub fn icu_tool_dir(&self) -> PathBuf {
        self.root.join("toolchains").join("bin").join("icudata_filter")
    }

    /// SDK version from `arkui-x.json`.
    pub fn version(&self) -> Result<SdkVersion> {
        let path = self.root.join("arkui-x.json");
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read SDK info: {}", path.display()))?;
        let info: SdkInfo = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse SDK info: {}", path.display()))?;
        info.version.parse()
    }
}

fn is_sdk_root(path: &Path) -> bool {
    path.join("engine").join("apiConfig.json").is_file()
}

/// A dotted numeric SDK version such as `5.1.0.57`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkVersion(Vec<u32>);

impl SdkVersion {
    pub fn new(parts: impl Into<Vec<u32>>) -> Self {
        SdkVersion(parts.into())
    }

    pub fn parts(&self) -> &[u32] {
        &self.0
    }
}

impl std::str::FromStr for SdkVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .trim()
            .split('.')
            .map(|p| {
                p.parse::<u32>()
                    .with_context(|| format!("invalid SDK version `{}`", s))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SdkVersion(parts))
    }
}

impl PartialOrd for SdkVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SdkVersion {
    /// Component-wise, missing components count as zero.
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            let a = self.0.get(i).copied().unwrap_or(0);
            let b = other.0.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}
