//! Global context for ace operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{self, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global ace data (~/.ace/)
    home: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        Ok(GlobalContext {
            cwd,
            home: config::global_config_dir(),
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Create a GlobalContext with a specific home directory.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The ace home directory (~/.ace/), if a home directory is known.
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join("config.toml"))
    }

    /// Resolve a project directory argument against the working directory.
    pub fn project_root(&self, project: Option<&Path>) -> PathBuf {
        match project {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => self.cwd.join(p),
            None => self.cwd.clone(),
        }
    }

    /// Load global and project configuration for a project.
    pub fn load_config(&self, project_root: &Path) -> Config {
        config::load_config(
            self.config_path().as_deref(),
            &config::project_config_path(project_root),
        )
    }
}
