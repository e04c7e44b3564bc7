//! Library path templates with architecture/profile placeholders.
//!
//! SDK manifests spell placeholders either bare (`libs/arch_type/libfoo.so`)
//! or braced (`libs/lib_{arch_type}.so`). Both forms are accepted. Any other
//! braced identifier is rejected when the template is parsed, so a typo in a
//! manifest fails at load time instead of leaking into a filesystem path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}|arch_type|build_modes").unwrap()
});

/// A named substitution point in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// SDK architecture token, e.g. `android-arm64-release`.
    ArchType,
    /// Build profile, e.g. `release`.
    BuildModes,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "arch_type" => Some(Placeholder::ArchType),
            "build_modes" => Some(Placeholder::BuildModes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// A parsed library path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

/// Error returned when a template names a placeholder nobody can fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlaceholder {
    pub name: String,
    pub template: String,
}

impl fmt::Display for UnknownPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown placeholder `{{{}}}` in `{}`",
            self.name, self.template
        )
    }
}

impl std::error::Error for UnknownPlaceholder {}

impl PathTemplate {
    /// Parse a template string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, UnknownPlaceholder> {
        let raw = raw.into();
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(&raw) {
            let Some(whole) = caps.get(0) else { continue };
            let placeholder = match caps.get(1) {
                Some(name) => match Placeholder::from_name(name.as_str()) {
                    Some(p) => p,
                    None => {
                        return Err(UnknownPlaceholder {
                            name: name.as_str().to_string(),
                            template: raw.clone(),
                        })
                    }
                },
                None => match Placeholder::from_name(whole.as_str()) {
                    Some(p) => p,
                    None => continue,
                },
            };

            if whole.start() > last {
                segments.push(Segment::Literal(raw[last..whole.start()].to_string()));
            }
            segments.push(Segment::Slot(placeholder));
            last = whole.end();
        }

        if last < raw.len() {
            segments.push(Segment::Literal(raw[last..].to_string()));
        }

        Ok(PathTemplate { raw, segments })
    }

    /// Prefix the template with a root directory.
    ///
    /// The root is inserted as a literal, so braces in an SDK install path
    /// are never read as placeholders.
    pub fn prefixed(mut self, root: &Path) -> Self {
        let joined = root.join(&self.raw).to_string_lossy().into_owned();
        let prefix = joined[..joined.len() - self.raw.len()].to_string();
        if !prefix.is_empty() {
            self.segments.insert(0, Segment::Literal(prefix));
        }
        self.raw = joined;
        self
    }

    /// The template text, including any root prefix.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the template contains the given placeholder.
    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Slot(p) if *p == placeholder))
    }

    /// Substitute every placeholder.
    pub fn render(&self, arch_type: &str, build_modes: &str) -> String {
        let mut out = String::with_capacity(self.raw.len() + arch_type.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(Placeholder::ArchType) => out.push_str(arch_type),
                Segment::Slot(Placeholder::BuildModes) => out.push_str(build_modes),
            }
        }
        out
    }

    /// Substitute every placeholder and return a path.
    pub fn render_path(&self, arch_type: &str, build_modes: &str) -> PathBuf {
        PathBuf::from(self.render(arch_type, build_modes))
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
