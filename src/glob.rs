// src/glob.rs

//! Glob expansion used to turn input patterns into literal paths.
//!
//! Planning only needs one capability from the outside world:
//! "expand this pattern into the ordered list of paths that match it".
//! [`GlobExpander`] is that seam. [`FsGlobExpander`] implements it on top of
//! [`FileSystem`] and `globset`, so tests can expand against a mock tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use tracing::trace;

use crate::fs::FileSystem;

/// Characters that make an input string a pattern rather than a literal path.
const GLOB_META: &[char] = &['*', '?', '['];

/// Whether `s` should be expanded as a glob.
pub fn is_glob(s: &str) -> bool {
    s.contains(GLOB_META)
}

/// Expands a pattern into matching literal paths.
///
/// Zero matches is an empty list, never an error. Errors are reserved for
/// patterns that cannot be compiled or trees that cannot be read.
pub trait GlobExpander {
    fn expand(&self, pattern: &str) -> Result<Vec<String>>;
}

/// Expands patterns relative to `root`, walking `fs`.
///
/// Results are `/`-separated, relative to `root`, and sorted.
#[derive(Debug, Clone)]
pub struct FsGlobExpander {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FsGlobExpander {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }
}

impl GlobExpander for FsGlobExpander {
    fn expand(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = compile_matcher(pattern)?;

        let base = self.root.join(literal_prefix(pattern));
        let mut matches: Vec<String> = self
            .fs
            .files_under(&base)?
            .iter()
            .filter_map(|path| relative_to(&self.root, path))
            .filter(|rel| matcher.is_match(rel))
            .collect();

        matches.sort();
        trace!(pattern, count = matches.len(), "glob expanded");
        Ok(matches)
    }
}

/// Fixed pattern → paths table. Useful wherever the tree is not on disk.
#[derive(Debug, Clone, Default)]
pub struct StaticGlobExpander {
    table: HashMap<String, Vec<String>>,
}

impl StaticGlobExpander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern<I, S>(mut self, pattern: &str, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table
            .insert(pattern.to_string(), paths.into_iter().map(Into::into).collect());
        self
    }
}

impl GlobExpander for StaticGlobExpander {
    fn expand(&self, pattern: &str) -> Result<Vec<String>> {
        compile_matcher(pattern)?;
        Ok(self.table.get(pattern).cloned().unwrap_or_default())
    }
}

/// `*` and `?` never cross a `/`, like a shell glob. `**` spans directories.
fn compile_matcher(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Leading directories of `pattern` that contain no glob syntax.
fn literal_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    let mut parts = pattern.split('/').peekable();
    while let Some(part) = parts.next() {
        // The final component names files, not a directory to descend into.
        if parts.peek().is_none() || is_glob(part) {
            break;
        }
        prefix.push(part);
    }
    prefix
}

fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s.trim_start_matches("./").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn expander(files: &[&str]) -> FsGlobExpander {
        let fs = MockFileSystem::with_files(files.iter().copied());
        FsGlobExpander::new(".", Arc::new(fs))
    }

    #[test]
    fn single_star_stays_within_directory() {
        let g = expander(&["src/b.txt", "src/a.txt", "src/nested/c.txt", "other/d.txt"]);
        assert_eq!(g.expand("src/*.txt").unwrap(), vec!["src/a.txt", "src/b.txt"]);
    }

    #[test]
    fn double_star_descends() {
        let g = expander(&["src/a.txt", "src/nested/c.txt"]);
        assert_eq!(
            g.expand("src/**/*.txt").unwrap(),
            vec!["src/a.txt", "src/nested/c.txt"]
        );
    }

    #[test]
    fn missing_directory_is_zero_matches() {
        let g = expander(&["src/a.txt"]);
        assert!(g.expand("lib/*.js").unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let g = expander(&[]);
        assert!(g.expand("src/[a.txt").is_err());
    }

    #[test]
    fn literal_prefix_stops_at_first_pattern_component() {
        assert_eq!(literal_prefix("src/lib/*.rs"), PathBuf::from("src/lib"));
        assert_eq!(literal_prefix("src/*/x.rs"), PathBuf::from("src"));
        assert_eq!(literal_prefix("*.rs"), PathBuf::new());
    }

    #[test]
    fn detects_glob_syntax() {
        assert!(is_glob("src/*.js"));
        assert!(is_glob("a?.txt"));
        assert!(!is_glob("src/main.js"));
    }
}
