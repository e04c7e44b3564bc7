//! Shell output and progress management.
//!
//! All user-facing status lines go through [`Shell`]: a right-aligned,
//! optionally coloured status word followed by a message. Diagnostics for
//! developers go through `tracing` instead.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// How much a run prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `--quiet`: errors only
    Quiet,
    #[default]
    Normal,
    /// `--verbose`: every status line, no progress bars
    Verbose,
}

/// Whether status words are coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Colour when stderr is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

/// The word a status line starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Copied,
    Created,
    Finished,
    Updated,
    Removed,

    Resolving,
    Copying,
    Splicing,
    Trimming,

    Info,
    /// Dry-run output: what a real run would do.
    Planned,

    Skipped,
    Unused,
    Warning,

    Error,
}

impl Status {
    fn word(self) -> &'static str {
        match self {
            Status::Copied => "Copied",
            Status::Created => "Created",
            Status::Finished => "Finished",
            Status::Updated => "Updated",
            Status::Removed => "Removed",
            Status::Resolving => "Resolving",
            Status::Copying => "Copying",
            Status::Splicing => "Splicing",
            Status::Trimming => "Trimming",
            Status::Info => "Info",
            Status::Planned => "Would",
            Status::Skipped => "Skipped",
            Status::Unused => "Unused",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    /// ANSI style: green for done, cyan for in progress, blue for notes,
    /// yellow for things left alone, red for errors.
    fn style(self) -> &'static str {
        match self {
            Status::Copied
            | Status::Created
            | Status::Finished
            | Status::Updated
            | Status::Removed => "\x1b[1;32m",
            Status::Resolving | Status::Copying | Status::Splicing | Status::Trimming => {
                "\x1b[1;36m"
            }
            Status::Info | Status::Planned => "\x1b[1;34m",
            Status::Skipped | Status::Unused | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Width the status word is right-aligned to.
const STATUS_WIDTH: usize = 12;

/// Writes status lines to stderr, or into a buffer for tests.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
    captured: Option<Mutex<Vec<String>>>,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        Shell {
            verbosity,
            use_color: match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
            captured: None,
        }
    }

    /// A shell from the global CLI flags. `quiet` beats `verbose`.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice) -> Self {
        let verbosity = match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        };
        Shell::new(verbosity, color)
    }

    /// A colourless shell that records lines instead of printing them.
    pub fn capturing(verbosity: Verbosity) -> Self {
        Shell {
            verbosity,
            use_color: false,
            captured: Some(Mutex::new(Vec::new())),
        }
    }

    /// Lines recorded by a [`Shell::capturing`] shell.
    pub fn captured(&self) -> Vec<String> {
        match &self.captured {
            Some(lines) => lines.lock().map(|l| l.clone()).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    /// Print one status line. Quiet shells print errors only.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }
        let line = format!("{} {}", self.status_word(status), msg);
        match &self.captured {
            Some(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(line);
                }
            }
            None => eprintln!("{}", line),
        }
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    pub fn error(&self, msg: impl Display) {
        self.status(Status::Error, msg);
    }

    fn status_word(&self, status: Status) -> String {
        if self.use_color {
            format!("{}{:>STATUS_WIDTH$}\x1b[0m", status.style(), status.word())
        } else {
            format!("{:>STATUS_WIDTH$}", status.word())
        }
    }

    /// A progress bar over `total` steps.
    ///
    /// Bars are only drawn for interactive normal-verbosity runs with more
    /// than one step; otherwise the returned handle does nothing.
    pub fn progress(&self, total: u64, msg: impl Display) -> Progress {
        let interactive = self.captured.is_none() && io::stderr().is_terminal();
        if self.verbosity != Verbosity::Normal || !interactive || total <= 1 {
            return Progress { bar: None };
        }
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template("{msg:>12.cyan.bold} [{bar:30}] {pos}/{len}") {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(msg.to_string());
        Progress { bar: Some(bar) }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}

/// Handle to a progress bar that may not be drawn.
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    /// Print a status line above the bar.
    pub fn println(&self, shell: &Shell, status: Status, msg: impl Display) {
        match &self.bar {
            Some(bar) => bar.suspend(|| shell.status(status, msg)),
            None => shell.status(status, msg),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

/// `0.42s` under a minute, `1.5m` above.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}
