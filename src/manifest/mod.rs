// src/manifest/mod.rs

//! Manifest (Rubefile) data model and loading.
//!
//! - [`model`] is the serde-backed shape of a manifest as written.
//! - [`loader`] finds the manifest on disk and parses JSON-with-comments or
//!   TOML into a [`Manifest`].

pub mod loader;
pub mod model;

pub use loader::{
    find_manifest, load_from_path, locate_manifest, parse_manifest, strip_comments,
    ManifestFormat, MANIFEST_NAMES,
};
pub use model::{Manifest, RawInput, RawOutput, TaskDeclaration};
