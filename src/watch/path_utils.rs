// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Component, Path};

/// Convert an event path into the form work items use: relative to `root`,
/// forward slashes, no `.` components.
///
/// Tries a direct `strip_prefix(root)` first, then again with both sides
/// canonicalized (macOS reports `/private/var/...` for `/var/...`).
///
/// Returns `None` if the path is outside `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) else {
        return None;
    };
    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}

/// Normalise a manifest-relative path string (`./src/a.c` -> `src/a.c`).
pub fn normalize_rel(path: &str) -> String {
    to_slash(Path::new(path))
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
