//! Filesystem utilities.

use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// List the `(source, destination)` file pairs a recursive copy of `src`
/// into `dst` would perform, without touching the filesystem.
///
/// A plain file yields a single pair.
pub fn copy_plan(src: &Path, dst: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    if !src.is_dir() {
        return Ok(vec![(src.to_path_buf(), dst.to_path_buf())]);
    }

    let mut pairs = Vec::new();
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to read directory: {}", src.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        pairs.push((entry.path().to_path_buf(), dst.join(relative)));
    }
    Ok(pairs)
}

/// Paths inside `dst` with no counterpart in the directory `src`.
///
/// A directory missing from `src` is reported once, not its contents. A
/// missing `dst` or a plain-file `src` yields nothing.
pub fn mirror_extras(src: &Path, dst: &Path) -> Result<Vec<PathBuf>> {
    if !src.is_dir() || !dst.is_dir() {
        return Ok(Vec::new());
    }

    let mut extras = Vec::new();
    let mut walk = WalkDir::new(dst).min_depth(1).sort_by_file_name().into_iter();
    while let Some(entry) = walk.next() {
        let entry =
            entry.with_context(|| format!("failed to read directory: {}", dst.display()))?;
        let relative = entry.path().strip_prefix(dst).unwrap_or(entry.path());
        if src.join(relative).exists() {
            continue;
        }
        if entry.file_type().is_dir() {
            walk.skip_current_dir();
        }
        extras.push(entry.path().to_path_buf());
    }
    Ok(extras)
}

/// Copy one file, creating the destination's parent directory.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst).with_context(|| {
        format!("failed to copy {} to {}", src.display(), dst.display())
    })?;
    Ok(())
}

/// Remove a file or a whole directory tree.
pub fn remove_path(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))
    } else {
        fs::remove_file(path).with_context(|| format!("failed to remove file: {}", path.display()))
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Replace a file's contents through a temporary file in the same directory.
///
/// Readers see either the old or the new contents, never a partial write.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write temporary file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to flush temporary file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Breadth-first search under `root` for an entry named `name`.
///
/// Returns the match closest to `root`, relative to it. Unreadable
/// directories are skipped.
pub fn find_breadth_first(root: &Path, name: &str) -> Option<PathBuf> {
    let mut queue = VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = queue.pop_front() {
        let mut entries: Vec<_> = match fs::read_dir(&dir) {
            Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
            Err(e) => {
                tracing::debug!("skipping {}: {}", dir.display(), e);
                continue;
            }
        };
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            if entry.file_name() == name {
                return Some(relative_path(root, &path));
            }
            if path.is_dir() {
                queue.push_back(path);
            }
        }
    }
    None
}
