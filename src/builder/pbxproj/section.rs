//! Locating one section of a project file and rebuilding its body.

use super::anchors::{NameDelimiters, SectionAnchors, SectionKind};
use super::PbxprojError;

/// One line of a section body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The line as written, without its newline.
    pub line: String,
    /// Library name between the section's delimiters, if any.
    pub name: Option<String>,
}

impl Entry {
    fn parse(line: &str, delimiters: NameDelimiters) -> Self {
        Entry {
            line: line.to_string(),
            name: parse_name(line, delimiters),
        }
    }

    pub fn is_named(&self, lib: &str) -> bool {
        self.name.as_deref() == Some(lib)
    }

    /// The object identifier leading the line.
    pub fn identifier(&self) -> Option<&str> {
        self.line
            .split_whitespace()
            .next()
            .filter(|token| !token.starts_with("/*"))
    }

    fn indent(&self) -> &str {
        let trimmed = self.line.trim_start_matches([' ', '\t']);
        &self.line[..self.line.len() - trimmed.len()]
    }
}

fn parse_name(line: &str, delimiters: NameDelimiters) -> Option<String> {
    let open = line.find(delimiters.open)? + delimiters.open.len();
    let close = open + 1 + line.get(open + 1..)?.find(delimiters.close)?;
    Some(line[open..close].to_string())
}

/// A located section: the byte span of its body plus the parsed lines.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    /// First byte of the body.
    start: usize,
    /// First byte of the end marker.
    end: usize,
    /// The body begins on the line of the last chain marker.
    inline: bool,
    pub entries: Vec<Entry>,
    /// Text between the last body newline and the end marker.
    tail: String,
}

impl Section {
    /// Find the section described by `anchors` in `text`.
    pub fn locate(text: &str, anchors: &SectionAnchors) -> Result<Self, PbxprojError> {
        let anchor_missing = |upto: usize| PbxprojError::AnchorNotFound {
            section: anchors.kind,
            chain: anchors.describe_chain(upto),
        };

        let first = anchors.chain[0];
        let mut pos = text.rfind(first).ok_or_else(|| anchor_missing(1))? + first.len();
        for (i, marker) in anchors.chain.iter().enumerate().skip(1) {
            let found = text[pos..].find(marker).ok_or_else(|| anchor_missing(i + 1))?;
            pos += found + marker.len();
        }

        let end = pos
            + text[pos..]
                .find(anchors.end)
                .ok_or_else(|| PbxprojError::EndNotFound {
                    section: anchors.kind,
                    end: anchors.end,
                    chain: anchors.describe_chain(anchors.chain.len()),
                })?;

        let rest = text[pos..end].trim_start_matches([' ', '\t']);
        let (start, inline) = if rest.starts_with('\n') {
            (end - rest.len() + 1, false)
        } else {
            (pos, true)
        };

        let body = &text[start..end];
        let (lines, tail) = match body.rfind('\n') {
            Some(i) => (&body[..=i], &body[i + 1..]),
            None => ("", body),
        };

        Ok(Section {
            kind: anchors.kind,
            start,
            end,
            inline,
            entries: lines
                .split_terminator('\n')
                .map(|line| Entry::parse(line, anchors.name))
                .collect(),
            tail: tail.to_string(),
        })
    }

    /// Whether any entry names `lib`.
    pub fn contains(&self, lib: &str) -> bool {
        self.entries.iter().any(|e| e.is_named(lib))
    }

    /// Entries naming `lib`.
    pub fn entries_for<'s>(&'s self, lib: &'s str) -> impl Iterator<Item = &'s Entry> + 's {
        self.entries.iter().filter(move |e| e.is_named(lib))
    }

    /// Indentation for new entries, taken from the first existing entry.
    pub fn item_indent(&self) -> String {
        if let Some(entry) = self.entries.iter().find(|e| e.name.is_some()) {
            return entry.indent().to_string();
        }
        if !self.inline && !self.tail.is_empty() && self.tail.trim().is_empty() {
            format!("{}\t", self.tail)
        } else {
            "\t\t".to_string()
        }
    }

    /// Rebuild `text` with this section's body replaced by the kept entries
    /// followed by `additions` (unindented lines).
    pub fn rebuild(&self, text: &str, keep: impl Fn(&Entry) -> bool, additions: &[String]) -> String {
        let indent = self.item_indent();
        let mut out = String::with_capacity(text.len() + additions.len() * 160);
        out.push_str(&text[..self.start]);

        let mut wrote_line = false;
        for entry in self.entries.iter().filter(|e| keep(e)) {
            if self.inline && !wrote_line {
                out.push('\n');
            }
            out.push_str(&entry.line);
            out.push('\n');
            wrote_line = true;
        }
        for line in additions {
            if self.inline && !wrote_line {
                out.push('\n');
            }
            out.push_str(&indent);
            out.push_str(line);
            out.push('\n');
            wrote_line = true;
        }

        out.push_str(&self.tail);
        out.push_str(&text[self.end..]);
        out
    }
}
