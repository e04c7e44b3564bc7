//! Actionable error reports for the CLI.
//!
//! A [`Diagnostic`] is a headline, the facts behind it and a numbered list
//! of things to try. Library code returns typed errors; the binary turns
//! the ones a user can act on into diagnostics.

use std::fmt::{self, Write as _};
use std::path::PathBuf;

/// Suggestions shared by several failure paths.
pub mod suggestions {
    pub const NO_SDK: &str =
        "Pass `--sdk <dir>`, set ARKUIX_SDK_PATH, or add `[sdk] path` to ~/.ace/config.toml";

    pub const NO_NATIVE_PROJECT: &str =
        "Run the command from an ArkUI-X project root containing `.arkui-x/`";

    pub const LIBRARY_MISSING: &str =
        "Reinstall the SDK, or set `[build] not_found = \"ignore-all\"` to skip missing libraries";

    pub const NO_COLLECTIONS: &str =
        "Build the OpenHarmony project first so hvigor records the modules it uses";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }

    fn style(self) -> &'static str {
        match self {
            Severity::Error => "\x1b[1;31m",
            Severity::Warning => "\x1b[1;33m",
            Severity::Note => "\x1b[1;36m",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// File the problem was found in
    pub location: Option<PathBuf>,
    /// Facts that led to the problem, one per line
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            message: message.into(),
            location: None,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, message)
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    pub fn with_context(mut self, line: impl Into<String>) -> Self {
        self.context.push(line.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Render for a terminal:
    ///
    /// ```text
    /// error: library not found: .../libweb.so
    ///   --> /sdk/plugins/api/web
    ///   = required by module `plugin.web`
    ///
    /// help: consider:
    ///   1. Reinstall the SDK, ...
    /// ```
    pub fn format(&self, color: bool) -> String {
        let paint = |style: &str, text: &str| {
            if color {
                format!("{}{}\x1b[0m", style, text)
            } else {
                text.to_string()
            }
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: {}",
            paint(self.severity.style(), self.severity.label()),
            self.message
        );
        if let Some(path) = &self.location {
            let _ = writeln!(out, "  --> {}", path.display());
        }
        for line in &self.context {
            let _ = writeln!(out, "  = {}", line);
        }
        if !self.suggestions.is_empty() {
            let _ = writeln!(out, "\n{}: consider:", paint("\x1b[1;32m", "help"));
            for (n, suggestion) in self.suggestions.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", n + 1, suggestion);
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

impl std::error::Error for Diagnostic {}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
