// src/manifest/model.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::types::TaskName;

/// A parsed manifest: every task declaration, in file order.
///
/// ```json
/// {
///     # comments run to end of line
///     "compile": {
///         "input": "src/*.coffee",
///         "output": "lib/*.js",
///         "multiCommand": "coffee -c -o lib $(input)"
///     },
///     "bundle": {
///         "input": { "task": "compile" },
///         "output": "dist/app.js",
///         "command": "cat $(inputs) > $(output)",
///         "description": "Concatenate compiled sources"
///     }
/// }
/// ```
///
/// Declaration order is significant (work items are emitted in this order),
/// so this is a list rather than a map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    tasks: Vec<(TaskName, TaskDeclaration)>,
}

impl Manifest {
    pub fn new(tasks: Vec<(TaskName, TaskDeclaration)>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> impl Iterator<Item = (&str, &TaskDeclaration)> {
        self.tasks.iter().map(|(name, decl)| (name.as_str(), decl))
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&TaskDeclaration> {
        self.tasks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, decl)| decl)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ManifestVisitor;

        impl<'de> Visitor<'de> for ManifestVisitor {
            type Value = Manifest;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping from task name to task declaration")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Manifest, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut tasks: Vec<(TaskName, TaskDeclaration)> = Vec::new();
                while let Some((name, decl)) = map.next_entry::<TaskName, TaskDeclaration>()? {
                    if tasks.iter().any(|(n, _)| *n == name) {
                        return Err(serde::de::Error::custom(format!(
                            "task '{name}' is declared more than once"
                        )));
                    }
                    tasks.push((name, decl));
                }
                Ok(Manifest { tasks })
            }
        }

        deserializer.deserialize_map(ManifestVisitor)
    }
}

/// One manifest entry, as written.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskDeclaration {
    /// Literal path, glob pattern, cross-reference object, or a list of those.
    #[serde(default)]
    pub input: Option<RawInput>,

    /// Output template (may contain one `*` filled from the input glob), or a
    /// list of literal paths.
    #[serde(default)]
    pub output: Option<RawOutput>,

    /// Runs once with all inputs and produces a single output.
    #[serde(default, alias = "exec")]
    pub command: Option<String>,

    /// Runs once per input/output pair.
    #[serde(default, rename = "multiCommand", alias = "multiexec")]
    pub multi_command: Option<String>,

    /// Shown in the task listing only.
    #[serde(default)]
    pub description: Option<String>,
}

/// Raw `input` value. Reference objects are kept loosely typed here so that
/// a malformed one becomes a precise manifest error instead of a parse error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawInput {
    Path(String),
    List(Vec<RawInput>),
    Reference(BTreeMap<String, serde_json::Value>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawOutput {
    Template(String),
    Paths(Vec<String>),
}
