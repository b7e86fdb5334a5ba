// src/fs/mock.rs

//! In-memory filesystem for tests.
//!
//! Paths are normalised on the way in and out, so `./src/a.txt` and
//! `src/a.txt` name the same entry. Directories are created implicitly for
//! every added file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use super::FileSystem;

#[derive(Debug, Clone)]
enum MockEntry {
    File(String),
    Dir(BTreeSet<String>),
}

#[derive(Debug, Clone)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::new(), MockEntry::Dir(BTreeSet::new()));
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Build a filesystem holding the given (empty) files.
    pub fn with_files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let fs = Self::new();
        for p in paths {
            fs.add_file(p, "");
        }
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = normalise(path.as_ref());
        let mut entries = self.entries.lock().unwrap();
        link_into_parent(&mut entries, &path);
        entries.insert(path, MockEntry::File(content.into()));
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop `.` components so lookups are insensitive to a leading `./`.
fn normalise(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn link_into_parent(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return;
    };
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();

    if !entries.contains_key(&parent) {
        link_into_parent(entries, &parent);
        entries.insert(parent.clone(), MockEntry::Dir(BTreeSet::new()));
    }
    if let Some(MockEntry::Dir(children)) = entries.get_mut(&parent) {
        children.insert(name.to_string());
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let entries = self.entries.lock().unwrap();
        match entries.get(&normalise(path)) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        let entries = self.entries.lock().unwrap();
        matches!(entries.get(&normalise(path)), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let entries = self.entries.lock().unwrap();
        matches!(entries.get(&normalise(path)), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(&normalise(dir)) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| dir.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", dir)),
        }
    }
}
