// src/watch/mod.rs

//! File watching for `--watch`.
//!
//! Turns filesystem changes to the build's source files into
//! `RuntimeEvent::ArtifactsTouched`. Files the build itself produces are
//! ignored, so a build never retriggers itself.

pub mod event_handler;
pub mod path_utils;
pub mod watcher;

pub use event_handler::touched_sources;
pub use watcher::{WatcherHandle, spawn_watcher};
