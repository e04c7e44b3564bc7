//! Trimming the ICU data blob to the locales a project uses.
//!
//! The engine ships one `icudt<N>l.dat` holding data for every locale.
//! When the build includes the `i18n` or `intl` plugin and the project
//! restricts its locales, the SDK's filter tool rebuilds the blob with only
//! those locales. Trimming only saves space: whenever it cannot be done the
//! untrimmed blob is shipped instead.

pub mod locales;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::platform::{FileType, Platform};
use crate::core::project::Project;
use crate::core::sdk::{Sdk, SdkVersion};
use crate::resolver::ResolvedDependencySet;
use crate::util::fs as ace_fs;
use crate::util::process::{find_node, CommandRunner, ProcessBuilder};

pub use locales::LocaleSelection;

/// Lowest OpenHarmony API level whose projects ship filtered ICU data.
pub const MIN_API_VERSION: u32 = 18;

/// Lowest SDK version carrying the filter tool.
pub const MIN_SDK_VERSION: [u32; 4] = [5, 1, 0, 57];

/// Which plugin data the filter keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcuModule {
    I18n,
    Intl,
    Both,
}

impl IcuModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            IcuModule::I18n => "i18n",
            IcuModule::Intl => "intl",
            IcuModule::Both => "both",
        }
    }

    /// The internationalisation plugins among the resolved modules.
    pub fn detect(deps: &ResolvedDependencySet) -> Option<Self> {
        let mut i18n = false;
        let mut intl = false;
        for entry in deps.iter() {
            for template in entry.libraries(Platform::Android) {
                let raw = template.raw();
                if raw.contains("libi18n.so") {
                    i18n = true;
                } else if raw.contains("libintl.so") {
                    intl = true;
                }
            }
        }
        match (i18n, intl) {
            (true, true) => Some(IcuModule::Both),
            (true, false) => Some(IcuModule::I18n),
            (false, true) => Some(IcuModule::Intl),
            (false, false) => None,
        }
    }
}

impl fmt::Display for IcuModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The SDK's filter tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTool {
    pub node: PathBuf,
    pub script: PathBuf,
    pub data_dir: PathBuf,
    pub host_dir: PathBuf,
}

impl FilterTool {
    /// Locate the tool in an SDK. Every piece must be present.
    pub fn locate(sdk: &Sdk, node: Option<PathBuf>) -> Result<Self, String> {
        let dir = sdk.icu_tool_dir();
        let (host, icupkg) = host_tool_names();
        let tool = FilterTool {
            node: node.ok_or_else(|| "Node.js was not found in PATH".to_string())?,
            script: dir.join("filter_data.js"),
            data_dir: dir.join("data"),
            host_dir: dir.join(host),
        };

        for required in [
            &tool.script,
            &tool.data_dir,
            &tool.host_dir.join(icupkg),
        ] {
            if !required.exists() {
                return Err(format!("missing {}", required.display()));
            }
        }
        Ok(tool)
    }

    fn command(&self, dat_file: &Path, out_dir: &Path, filter: &Path, module: IcuModule) -> ProcessBuilder {
        ProcessBuilder::new(&self.node)
            .arg(&self.script)
            .arg("--res_dir")
            .arg(&self.data_dir)
            .arg("--dat_file")
            .arg(dat_file)
            .arg("--tool_dir")
            .arg(&self.host_dir)
            .arg("--out_dir")
            .arg(out_dir)
            .arg("--filter")
            .arg(filter)
            .arg("--module")
            .arg(module.as_str())
    }
}

fn host_tool_names() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("windows", "icupkg.exe")
    } else if cfg!(target_os = "macos") {
        ("mac", "icupkg")
    } else {
        ("linux", "icupkg")
    }
}

/// What to do with the ICU blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcuPlan {
    /// Leave the project alone.
    Skip { reason: String },
    /// Ship the untrimmed blob.
    CopyFull {
        source: PathBuf,
        dest: PathBuf,
        reason: String,
    },
    /// Filter the blob down to `locales`.
    Trim {
        source: PathBuf,
        dest: PathBuf,
        locales: Vec<String>,
        module: IcuModule,
        tool: FilterTool,
    },
}

/// What was done with the ICU blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcuOutcome {
    Skipped { reason: String },
    Copied { dest: PathBuf, reason: String },
    Trimmed { dest: PathBuf, locales: Vec<String> },
}

impl IcuOutcome {
    pub fn is_trimmed(&self) -> bool {
        matches!(self, IcuOutcome::Trimmed { .. })
    }
}

/// Decides on and performs ICU data trimming for one build.
pub struct IcuDataFilterBridge<'a> {
    sdk: &'a Sdk,
    project: &'a Project,
    runner: &'a dyn CommandRunner,
    node: Option<PathBuf>,
}

impl<'a> IcuDataFilterBridge<'a> {
    pub fn new(sdk: &'a Sdk, project: &'a Project, runner: &'a dyn CommandRunner) -> Self {
        IcuDataFilterBridge {
            sdk,
            project,
            runner,
            node: find_node(),
        }
    }

    /// Use `node` instead of the one found in PATH.
    pub fn with_node(mut self, node: Option<PathBuf>) -> Self {
        self.node = node;
        self
    }

    /// Where the blob goes in the project.
    pub fn destination_dir(&self, platform: Platform) -> PathBuf {
        if platform.is_ios() {
            self.project.ios_dir().join("arkui-x").join("systemres")
        } else {
            let module = if self.project.is_app_project() {
                "app"
            } else {
                "library"
            };
            self.project
                .android_dir()
                .join(module)
                .join("src/main/assets/arkui-x/systemres")
        }
    }

    /// Decide what to do, touching nothing.
    pub fn plan(
        &self,
        deps: &ResolvedDependencySet,
        file_type: FileType,
        api_version: Option<u32>,
    ) -> IcuPlan {
        let skip = |reason: String| IcuPlan::Skip { reason };

        match api_version {
            Some(api) if api >= MIN_API_VERSION => {}
            Some(api) => return skip(format!("API {} is below {}", api, MIN_API_VERSION)),
            None => return skip("the project API level is unknown".to_string()),
        }

        let min = SdkVersion::new(MIN_SDK_VERSION);
        match self.sdk.version() {
            Ok(version) if version >= min => {}
            Ok(version) => return skip(format!("SDK {} is older than {}", version, min)),
            Err(e) => return skip(format!("{:#}", e)),
        }

        let Some(source) = self.sdk.icu_data_file() else {
            return skip("the SDK ships no ICU data".to_string());
        };
        let Some(dat_name) = source.file_name() else {
            return skip("the SDK ships no ICU data".to_string());
        };
        let platform = deps.platform();
        let dest = self.destination_dir(platform).join(dat_name);
        let copy_full = |reason: String| IcuPlan::CopyFull {
            source: source.clone(),
            dest: dest.clone(),
            reason,
        };

        let Some(module) = IcuModule::detect(deps) else {
            return copy_full("no i18n or intl plugin is used".to_string());
        };

        let locales = match LocaleSelection::for_project(self.project, platform, file_type) {
            LocaleSelection::Locales(locales) => locales,
            LocaleSelection::Unrestricted => {
                return copy_full("the project does not restrict its locales".to_string())
            }
            LocaleSelection::Unsupported(items) => {
                return copy_full(format!("unsupported locales: {}", items.join(", ")))
            }
        };

        match FilterTool::locate(self.sdk, self.node.clone()) {
            Ok(tool) => IcuPlan::Trim {
                source,
                dest,
                locales,
                module,
                tool,
            },
            Err(reason) => {
                tracing::warn!("cannot trim ICU data: {}", reason);
                copy_full(reason)
            }
        }
    }

    /// Carry out a plan.
    ///
    /// A failed filter run falls back to the untrimmed blob; only failing to
    /// write the project is an error.
    pub fn execute(&self, plan: IcuPlan) -> Result<IcuOutcome> {
        match plan {
            IcuPlan::Skip { reason } => {
                tracing::debug!("ICU data left alone: {}", reason);
                Ok(IcuOutcome::Skipped { reason })
            }
            IcuPlan::CopyFull {
                source,
                dest,
                reason,
            } => {
                tracing::info!("shipping full ICU data: {}", reason);
                ace_fs::copy_file(&source, &dest)?;
                Ok(IcuOutcome::Copied { dest, reason })
            }
            IcuPlan::Trim {
                source,
                dest,
                locales,
                module,
                tool,
            } => match self.run_filter(&source, &locales, module, &tool) {
                Ok(trimmed) => {
                    ace_fs::copy_file(&trimmed.path, &dest)?;
                    Ok(IcuOutcome::Trimmed { dest, locales })
                }
                Err(e) => {
                    tracing::warn!("ICU data filter failed, shipping full data: {:#}", e);
                    ace_fs::copy_file(&source, &dest)?;
                    Ok(IcuOutcome::Copied {
                        dest,
                        reason: "the filter tool failed".to_string(),
                    })
                }
            },
        }
    }

    /// Plan and execute in one step.
    pub fn maybe_trim(
        &self,
        deps: &ResolvedDependencySet,
        file_type: FileType,
        api_version: Option<u32>,
    ) -> Result<IcuOutcome> {
        self.execute(self.plan(deps, file_type, api_version))
    }

    fn run_filter(
        &self,
        source: &Path,
        locales: &[String],
        module: IcuModule,
        tool: &FilterTool,
    ) -> Result<FilterOutput> {
        let work = TempDir::new().context("failed to create a directory for the ICU filter")?;
        let filter = work.path().join("filter.json");
        let out_dir = work.path().join("out");
        let json = serde_json::to_string_pretty(locales)?;
        ace_fs::write_string(&filter, &json)?;

        self.runner
            .run(&tool.command(source, &out_dir, &filter, module))
            .context("ICU data filter failed")?;

        let name = source.file_name().unwrap_or_default();
        let path = out_dir.join(name);
        if !path.is_file() {
            anyhow::bail!("the filter produced no {}", path.display());
        }
        Ok(FilterOutput { _work: work, path })
    }
}

/// A filtered blob, alive as long as its temporary directory.
struct FilterOutput {
    _work: TempDir,
    path: PathBuf,
}
