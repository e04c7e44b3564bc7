//! Test utilities for ace unit tests.
//!
//! Provides a scripted [`CommandRunner`] and on-disk SDK/project fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use ace::test_support::{MockExecutor, MockProcessOutput, SdkFixture};
//!
//! #[test]
//! fn test_example() {
//!     let tmp = tempfile::TempDir::new().unwrap();
//!     let sdk = SdkFixture::new(tmp.path().join("sdk")).with_icu_tool().write().unwrap();
//!
//!     let runner = MockExecutor::new().expect_contains("filter_data.js", MockProcessOutput::success(""));
//!     // Hand `&runner` to an IcuDataFilterBridge...
//! }
//! ```

pub mod fixtures;

use std::fmt;
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::util::process::{CommandRunner, ProcessBuilder};

pub use fixtures::*;

/// What a scripted command "prints" and how it exits.
#[derive(Debug, Clone, Default)]
pub struct MockProcessOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl MockProcessOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            stdout: stdout.into(),
            ..MockProcessOutput::default()
        }
    }

    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stderr: stderr.into(),
            ..MockProcessOutput::default()
        }
    }
}

type Effect = Box<dyn Fn(&ProcessBuilder) + Send + Sync>;

/// Scripted [`CommandRunner`].
///
/// Each command is answered by the first script whose substring appears in
/// its command line, else by the default answer; with neither the command
/// fails as unexpected. Every command line is recorded. After a successful
/// answer the effect runs, standing in for the files the real tool writes.
#[derive(Default)]
pub struct MockExecutor {
    scripts: Vec<(String, MockProcessOutput)>,
    default_output: Option<MockProcessOutput>,
    effect: Option<Effect>,
    calls: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        MockExecutor::default()
    }

    /// Answer commands containing `substring` with `output`.
    pub fn expect_contains(mut self, substring: &str, output: MockProcessOutput) -> Self {
        self.scripts.push((substring.to_string(), output));
        self
    }

    /// Answer for commands no script matches.
    pub fn with_default(mut self, output: MockProcessOutput) -> Self {
        self.default_output = Some(output);
        self
    }

    pub fn with_effect(mut self, effect: impl Fn(&ProcessBuilder) + Send + Sync + 'static) -> Self {
        self.effect = Some(Box::new(effect));
        self
    }

    /// Every command line run so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn answer(&self, line: &str) -> Option<&MockProcessOutput> {
        self.scripts
            .iter()
            .find(|(substring, _)| line.contains(substring.as_str()))
            .map(|(_, output)| output)
            .or(self.default_output.as_ref())
    }
}

impl CommandRunner for MockExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> Result<()> {
        let line = cmd.display_command();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        let Some(output) = self.answer(&line) else {
            bail!("unexpected command: {}", line);
        };
        if output.status != 0 {
            bail!("`{}` failed with exit code {}\n{}", line, output.status, output.stderr);
        }
        if let Some(effect) = &self.effect {
            effect(cmd);
        }
        Ok(())
    }
}

impl fmt::Debug for MockExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockExecutor")
            .field("scripts", &self.scripts)
            .field("default_output", &self.default_output)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_scripts_answer_in_order() {
        let runner = MockExecutor::new()
            .expect_contains("--module i18n", MockProcessOutput::failure(1, "icupkg crashed"))
            .expect_contains("filter_data.js", MockProcessOutput::success(""));

        let filter = ProcessBuilder::new("node").arg("filter_data.js");
        runner.run(&filter.clone().args(["--module", "intl"])).unwrap();
        let err = runner
            .run(&filter.args(["--module", "i18n"]))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("icupkg crashed"));
        assert!(runner.run(&ProcessBuilder::new("icupkg")).is_err());

        assert_eq!(
            runner.calls(),
            [
                "node filter_data.js --module intl",
                "node filter_data.js --module i18n",
                "icupkg",
            ]
        );
    }

    #[test]
    fn test_effect_runs_on_success_only() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let runner = MockExecutor::new()
            .expect_contains("fail", MockProcessOutput::failure(2, ""))
            .with_default(MockProcessOutput::success(""))
            .with_effect(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });

        runner.run(&ProcessBuilder::new("ok")).unwrap();
        assert!(runner.run(&ProcessBuilder::new("fail")).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
