// src/watch/event_handler.rs

//! Filtering of notify events down to touched source artifacts.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use notify::{Event, EventKind};
use tracing::debug;

use crate::watch::path_utils::{normalize_rel, relative_str};

/// Maps normalised paths back to the exact strings the work order uses.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    by_normalized: HashMap<String, String>,
}

impl SourceSet {
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let by_normalized = sources
            .into_iter()
            .map(Into::into)
            .map(|s| (normalize_rel(&s), s))
            .collect();
        Self { by_normalized }
    }

    pub fn len(&self) -> usize {
        self.by_normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_normalized.is_empty()
    }

    fn lookup(&self, rel: &str) -> Option<&str> {
        self.by_normalized.get(rel).map(String::as_str)
    }
}

/// Whether an event can change file contents. Access and metadata-only
/// events are ignored.
pub fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => false,
    }
}

/// The source artifacts (as written in the work order) that `paths` hit.
pub fn touched_sources(root: &Path, paths: &[PathBuf], sources: &SourceSet) -> Vec<String> {
    let mut touched = BTreeSet::new();
    for path in paths {
        let Some(rel) = relative_str(root, path) else {
            debug!(?path, "event outside watched root");
            continue;
        };
        if let Some(source) = sources.lookup(&rel) {
            touched.insert(source.to_string());
        }
    }
    touched.into_iter().collect()
}

/// Source artifacts touched by one notify event.
pub fn process_event(root: &Path, event: &Event, sources: &SourceSet) -> Vec<String> {
    if !is_relevant(&event.kind) {
        return Vec::new();
    }
    touched_sources(root, &event.paths, sources)
}
