// src/manifest/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{ManifestError, Result, RubeError};
use crate::fs::FileSystem;
use crate::manifest::model::Manifest;

/// File names recognised as a manifest, in lookup order.
pub const MANIFEST_NAMES: [&str; 3] = ["Rubefile", "Rubefile.json", "Rubefile.toml"];

/// Syntax of a manifest file, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// JSON with `#` line comments. The default for any non-`.toml` name.
    Json,
    Toml,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ManifestFormat::Toml,
            _ => ManifestFormat::Json,
        }
    }
}

/// Parse manifest text.
///
/// This only performs deserialization. Semantic checks (references, cycles,
/// output arity) happen when the manifest is planned.
pub fn parse_manifest(
    contents: &str,
    format: ManifestFormat,
) -> std::result::Result<Manifest, ManifestError> {
    match format {
        ManifestFormat::Json => serde_json::from_str(&strip_comments(contents))
            .map_err(|e| ManifestError::Parse(e.to_string())),
        ManifestFormat::Toml => {
            toml::from_str(contents).map_err(|e| ManifestError::Parse(e.to_string()))
        }
    }
}

/// Read and parse the manifest at `path`.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Manifest> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path)?;
    let format = ManifestFormat::from_path(path);
    debug!(?path, ?format, "parsing manifest");
    Ok(parse_manifest(&contents, format)?)
}

/// Look for a manifest in `start` and then in every parent directory,
/// returning the nearest one.
pub fn find_manifest(fs: &dyn FileSystem, start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .flat_map(|dir| MANIFEST_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| fs.is_file(candidate))
}

/// Locate the manifest: an explicit path wins, otherwise search upwards from
/// `cwd`.
pub fn locate_manifest(
    fs: &dyn FileSystem,
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    find_manifest(fs, cwd).ok_or_else(|| {
        RubeError::ManifestNotFound(format!(
            "{} in {:?} and its parents",
            MANIFEST_NAMES.join(", "),
            cwd
        ))
    })
}

/// Remove `#` comments running to end of line. A `#` inside a JSON string
/// literal is kept.
pub fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut in_comment = false;

    for c in src.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                out.push(c);
            }
            continue;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            continue;
        }
        match c {
            '#' => in_comment = true,
            '"' => {
                in_string = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    out
}
