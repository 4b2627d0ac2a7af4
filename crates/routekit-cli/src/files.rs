use anyhow::{Context, Result};
use routekit::v1::{EntityNode, Forest};
use similar::TextDiff;
use std::io::{self, Read, Write};
use std::path::Path;

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Read a file, or stdin when `path` is `-`.
pub fn read_text(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn read_forest(path: &Path) -> Result<Forest> {
    let content = read_text(path)?;
    Forest::from_json(&content)
        .with_context(|| format!("failed to parse forest JSON: {}", path.display()))
}

pub fn read_node(path: &Path) -> Result<EntityNode> {
    let content = read_text(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse entity JSON: {}", path.display()))
}

/// Replace `path` with `text` through a temp file in the same directory, so
/// a failed write never leaves a truncated file behind.
pub fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .context("failed to create temp file for atomic write")?;
    tmp.write_all(text.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to persist {}", path.display()))?;
    Ok(())
}

pub fn compute_diff(old: &str, new: &str) -> Option<String> {
    let diff = TextDiff::from_lines(old, new);
    let unified = diff.unified_diff().context_radius(3).to_string();
    if unified.is_empty() {
        None
    } else {
        Some(unified)
    }
}

/// Print the diff from `old` to `new`, or a note when nothing changes.
pub fn print_diff(old: &str, new: &str) {
    match compute_diff(old, new) {
        Some(diff) => print!("{diff}"),
        None => eprintln!("no changes"),
    }
}

pub fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize JSON")
}
