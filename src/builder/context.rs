//! Build context - SDK, project, target and policy for one packaging run.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::layout::LibraryLayout;
use crate::core::platform::{BuildProfile, FileType, Platform};
use crate::core::project::Project;
use crate::core::sdk::Sdk;

/// What to do when a library declared by a manifest is missing from the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotFoundAction {
    /// Stop the build.
    Abort,
    /// Skip this library and ask again for the next one.
    IgnoreOnce,
    /// Skip this and every later missing library without asking.
    #[default]
    IgnoreAll,
}

impl NotFoundAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotFoundAction::Abort => "abort",
            NotFoundAction::IgnoreOnce => "ignore",
            NotFoundAction::IgnoreAll => "ignore-all",
        }
    }
}

impl fmt::Display for NotFoundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NotFoundAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(NotFoundAction::Abort),
            "ignore" | "ignore-once" => Ok(NotFoundAction::IgnoreOnce),
            "ignore-all" => Ok(NotFoundAction::IgnoreAll),
            _ => Err(format!(
                "invalid not-found action '{}'; expected 'abort', 'ignore', or 'ignore-all'",
                s
            )),
        }
    }
}

/// Decides how to treat a missing library.
pub trait NotFoundPolicy: Send + Sync {
    fn on_not_found(&self, module: &str, path: &Path) -> NotFoundAction;
}

/// A policy that always answers the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPolicy(pub NotFoundAction);

impl NotFoundPolicy for FixedPolicy {
    fn on_not_found(&self, _module: &str, _path: &Path) -> NotFoundAction {
        self.0
    }
}

/// Applies a [`NotFoundPolicy`] across a run, latching `ignore-all`.
pub struct NotFoundHandler {
    policy: Box<dyn NotFoundPolicy>,
    ignore_all: bool,
    missing: Vec<(String, PathBuf)>,
}

impl NotFoundHandler {
    pub fn new(policy: Box<dyn NotFoundPolicy>) -> Self {
        NotFoundHandler {
            policy,
            ignore_all: false,
            missing: Vec::new(),
        }
    }

    pub fn fixed(action: NotFoundAction) -> Self {
        NotFoundHandler::new(Box::new(FixedPolicy(action)))
    }

    /// Record a missing library and decide what to do about it.
    ///
    /// Once the policy has answered `IgnoreAll` it is not consulted again.
    pub fn handle(&mut self, module: &str, path: &Path) -> NotFoundAction {
        tracing::warn!("{}: cannot find library {}", module, path.display());

        let action = if self.ignore_all {
            NotFoundAction::IgnoreAll
        } else {
            self.policy.on_not_found(module, path)
        };

        if action == NotFoundAction::IgnoreAll {
            self.ignore_all = true;
        }
        if action != NotFoundAction::Abort {
            self.missing.push((module.to_string(), path.to_path_buf()));
        }
        action
    }

    pub fn ignoring_all(&self) -> bool {
        self.ignore_all
    }

    /// Libraries skipped so far, with the module that declared them.
    pub fn missing(&self) -> &[(String, PathBuf)] {
        &self.missing
    }
}

impl Default for NotFoundHandler {
    fn default() -> Self {
        NotFoundHandler::fixed(NotFoundAction::IgnoreAll)
    }
}

impl fmt::Debug for NotFoundHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotFoundHandler")
            .field("ignore_all", &self.ignore_all)
            .field("missing", &self.missing)
            .finish()
    }
}

/// Everything one packaging run needs, constructed once per invocation.
#[derive(Debug)]
pub struct BuildContext {
    /// SDK the libraries come from
    pub sdk: Sdk,

    /// Project receiving the libraries
    pub project: Project,

    /// Output file type being packaged
    pub file_type: FileType,

    /// Target platform
    pub platform: Platform,

    /// Build profile
    pub profile: BuildProfile,

    /// Android targets used when a sub-project declares no `abiFilters`
    pub target_platforms: Vec<String>,

    /// Delete managed libraries the build no longer needs
    pub clear_lib: bool,

    /// Report what would change without touching the project
    pub dry_run: bool,

    /// Architecture and destination tables
    pub layout: LibraryLayout,

    /// Missing-library policy and its latch
    pub not_found: NotFoundHandler,
}

impl BuildContext {
    pub fn new(sdk: Sdk, project: Project, file_type: FileType, simulator: bool) -> Self {
        BuildContext {
            sdk,
            project,
            file_type,
            platform: file_type.platform(simulator),
            profile: BuildProfile::default(),
            target_platforms: Vec::new(),
            clear_lib: false,
            dry_run: false,
            layout: LibraryLayout,
            not_found: NotFoundHandler::default(),
        }
    }

    pub fn with_profile(mut self, profile: BuildProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_target_platforms(mut self, target_platforms: Vec<String>) -> Self {
        self.target_platforms = target_platforms;
        self
    }

    pub fn with_clear_lib(mut self, clear_lib: bool) -> Self {
        self.clear_lib = clear_lib;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_not_found(mut self, handler: NotFoundHandler) -> Self {
        self.not_found = handler;
        self
    }

    /// Sub-projects receiving libraries for this file type.
    pub fn sub_projects(&self) -> Vec<String> {
        self.project.sub_projects(self.file_type)
    }

    /// Project ABIs for one sub-project.
    pub fn cpu_list(&self, sub_project: &str) -> Vec<String> {
        self.project
            .cpu_list(sub_project, self.platform, &self.target_platforms)
    }
}
