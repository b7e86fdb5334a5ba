// src/fs/mod.rs

//! The slice of the filesystem rube reads before anything runs.
//!
//! Manifest discovery probes for candidate files and reads one of them.
//! Glob expansion lists a directory tree. Everything else (commands reading
//! and writing artifacts) happens in child processes and never goes through
//! this trait.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// Read-only view of a directory tree.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Direct children of `dir`, each joined onto `dir`.
    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Every file below `dir`, at any depth, sorted.
    ///
    /// A missing `dir` has no files. Glob expansion calls this with the
    /// pattern's literal directory prefix.
    fn files_under(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !self.is_dir(dir) {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut pending = vec![dir.to_path_buf()];
        while let Some(next) = pending.pop() {
            for path in self.read_dir(&next)? {
                if self.is_dir(&path) {
                    pending.push(path);
                } else if self.is_file(&path) {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

/// The real disk.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::read_dir(dir)
            .with_context(|| format!("listing {}", dir.display()))?
            .map(|entry| Ok(entry?.path()))
            .collect()
    }
}
