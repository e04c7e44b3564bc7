//! Running external tools.
//!
//! The only external tool is the SDK's ICU data filter. It runs through
//! [`CommandRunner`], which tests replace with a scripted runner.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, |cmd, arg| cmd.arg(arg))
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// The command line as one string, for logs and errors.
    pub fn display_command(&self) -> String {
        self.to_string()
    }

    /// Run to completion with captured output. A nonzero exit is an error
    /// carrying the tool's stderr.
    pub fn exec_and_check(&self) -> Result<Output> {
        tracing::debug!("running `{}`", self);
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("exit code {}", c));
            bail!(
                "`{}` failed with {}\n{}",
                self,
                code,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }
        Ok(output)
    }
}

impl fmt::Display for ProcessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs external commands to completion.
pub trait CommandRunner {
    /// Run `cmd`, failing unless it exits successfully.
    fn run(&self, cmd: &ProcessBuilder) -> Result<()>;
}

/// Runs commands as real subprocesses, logging their stdout at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<()> {
        let output = cmd.exec_and_check()?;
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .for_each(|line| tracing::debug!("{}", line));
        Ok(())
    }
}

/// Find Node.js: `NODE` if it names an executable, else `node` in PATH.
pub fn find_node() -> Option<PathBuf> {
    std::env::var("NODE")
        .ok()
        .and_then(|node| which::which(node).ok())
        .or_else(|| which::which("node").ok())
}
