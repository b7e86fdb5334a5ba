// src/plan/normalize.rs

//! Declaration normalizer.
//!
//! Turns each raw [`TaskDeclaration`] into a [`ResolvedTask`] whose inputs
//! are a flat list of literal paths and not-yet-resolved task references.
//! Glob inputs are expanded here; when a task's whole input is one glob
//! string, its outputs are derived immediately and the task starts `ready`.

use serde_json::Value;
use tracing::debug;

use crate::errors::ManifestError;
use crate::glob::{GlobExpander, is_glob};
use crate::manifest::{RawInput, RawOutput, TaskDeclaration};
use crate::plan::wildcard::{WildcardCapture, has_placeholder};
use crate::types::TaskName;

/// Reference to other tasks whose outputs become this task's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Single(TaskName),
    Many(Vec<TaskName>),
}

impl TaskRef {
    pub fn names(&self) -> &[TaskName] {
        match self {
            TaskRef::Single(name) => std::slice::from_ref(name),
            TaskRef::Many(names) => names,
        }
    }
}

/// One element of a declared input, after flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSpec {
    Literal(String),
    Glob(String),
    Reference(TaskRef),
}

/// An input slot during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingInput {
    Path(String),
    Reference(TaskRef),
}

impl PendingInput {
    pub fn as_path(&self) -> Option<&str> {
        match self {
            PendingInput::Path(p) => Some(p),
            PendingInput::Reference(_) => None,
        }
    }
}

/// How a task executes, if at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecSpec {
    /// No command: the task only groups or names artifacts.
    None,
    /// One invocation over all inputs, producing one output.
    Single(String),
    /// One invocation per positional input/output pair.
    Multi(String),
}

/// The declared `output`, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTemplate {
    None,
    Template(String),
    Paths(Vec<String>),
}

/// A task declaration carrying its resolution progress.
///
/// `ready` is set once `inputs` holds only literal paths and `outputs` has
/// been derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTask {
    pub name: TaskName,
    pub description: Option<String>,
    pub exec: ExecSpec,
    pub output: OutputTemplate,
    pub inputs: Vec<PendingInput>,
    pub outputs: Vec<String>,
    pub ready: bool,
}

impl ResolvedTask {
    /// The literal input paths. Only complete once the task is ready.
    pub fn input_paths(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().filter_map(PendingInput::as_path)
    }

    pub fn has_command(&self) -> bool {
        !matches!(self.exec, ExecSpec::None)
    }
}

/// Normalize every declaration of a manifest, in declaration order.
pub fn normalize_all<'a, I>(
    declarations: I,
    globber: &dyn GlobExpander,
) -> Result<Vec<ResolvedTask>, ManifestError>
where
    I: IntoIterator<Item = (&'a str, &'a TaskDeclaration)>,
{
    declarations
        .into_iter()
        .map(|(name, decl)| normalize(name, decl, globber))
        .collect()
}

/// Normalize a single declaration.
pub fn normalize(
    name: &str,
    decl: &TaskDeclaration,
    globber: &dyn GlobExpander,
) -> Result<ResolvedTask, ManifestError> {
    let exec = match (&decl.command, &decl.multi_command) {
        (Some(_), Some(_)) => {
            return Err(ManifestError::ConflictingCommands {
                task: name.to_string(),
            });
        }
        (Some(cmd), None) => ExecSpec::Single(cmd.clone()),
        (None, Some(cmd)) => ExecSpec::Multi(cmd.clone()),
        (None, None) => ExecSpec::None,
    };

    let output = match &decl.output {
        None => OutputTemplate::None,
        Some(RawOutput::Template(t)) => OutputTemplate::Template(t.clone()),
        Some(RawOutput::Paths(paths)) => OutputTemplate::Paths(paths.clone()),
    };

    let mut specs = Vec::new();
    if let Some(input) = &decl.input {
        flatten_input(name, input, &mut specs)?;
    }

    let mut inputs = Vec::with_capacity(specs.len());
    for spec in specs {
        match spec {
            InputSpec::Literal(path) => inputs.push(PendingInput::Path(path)),
            InputSpec::Glob(pattern) => {
                let matches = globber.expand(&pattern).map_err(|e| ManifestError::InvalidGlob {
                    task: name.to_string(),
                    pattern: pattern.clone(),
                    detail: format!("{e:#}"),
                })?;
                debug!(task = name, %pattern, matches = matches.len(), "expanded glob input");
                inputs.extend(matches.into_iter().map(PendingInput::Path));
            }
            InputSpec::Reference(r) => inputs.push(PendingInput::Reference(r)),
        }
    }

    let mut task = ResolvedTask {
        name: name.to_string(),
        description: decl.description.clone(),
        exec,
        output,
        inputs,
        outputs: Vec::new(),
        ready: false,
    };

    if let Some(RawInput::Path(pattern)) = &decl.input {
        if is_glob(pattern) {
            task.outputs = derive_glob_outputs(&task, pattern)?;
            task.ready = true;
        }
    }

    Ok(task)
}

/// Outputs for a task whose whole input was a single glob pattern.
///
/// A wildcard template maps each matched input positionally. A template
/// without a wildcard names one shared output. A glob that matched nothing
/// leaves the task without outputs.
fn derive_glob_outputs(task: &ResolvedTask, pattern: &str) -> Result<Vec<String>, ManifestError> {
    if task.input_paths().next().is_none() {
        return Ok(Vec::new());
    }
    match &task.output {
        OutputTemplate::None => Ok(Vec::new()),
        OutputTemplate::Paths(paths) => Ok(paths.clone()),
        OutputTemplate::Template(template) if !has_placeholder(template) => {
            Ok(vec![template.clone()])
        }
        OutputTemplate::Template(template) => {
            let capture = WildcardCapture::new(pattern).map_err(|e| ManifestError::InvalidGlob {
                task: task.name.clone(),
                pattern: pattern.to_string(),
                detail: e.to_string(),
            })?;
            task.input_paths()
                .map(|input| {
                    capture.apply(input, template).ok_or_else(|| ManifestError::UnresolvedOutput {
                        task: task.name.clone(),
                        template: template.clone(),
                        detail: format!("input '{input}' does not match '{pattern}'"),
                    })
                })
                .collect()
        }
    }
}

fn flatten_input(
    task: &str,
    input: &RawInput,
    out: &mut Vec<InputSpec>,
) -> Result<(), ManifestError> {
    match input {
        RawInput::Path(p) if is_glob(p) => out.push(InputSpec::Glob(p.clone())),
        RawInput::Path(p) => out.push(InputSpec::Literal(p.clone())),
        RawInput::List(items) => {
            for item in items {
                flatten_input(task, item, out)?;
            }
        }
        RawInput::Reference(object) => {
            out.push(InputSpec::Reference(parse_reference(task, object)?))
        }
    }
    Ok(())
}

/// Accepts `{"task": ..}`, `{"tasks": ..}` or `{"outputs": ..}` (plus the
/// legacy `output`). All forms name producer tasks, as a string or a list.
fn parse_reference(
    task: &str,
    object: &std::collections::BTreeMap<String, Value>,
) -> Result<TaskRef, ManifestError> {
    let malformed = || ManifestError::MalformedReference {
        task: task.to_string(),
        detail: serde_json::to_string(object).unwrap_or_else(|_| format!("{object:?}")),
    };

    let mut entries = object.iter();
    let (key, value) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => return Err(malformed()),
    };
    if !matches!(key.as_str(), "task" | "tasks" | "outputs" | "output") {
        return Err(malformed());
    }

    match value {
        Value::String(name) => Ok(TaskRef::Single(name.clone())),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(malformed))
            .collect::<Result<Vec<_>, _>>()
            .map(TaskRef::Many),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glob::StaticGlobExpander;

    fn decl(json: &str) -> TaskDeclaration {
        serde_json::from_str(json).unwrap()
    }

    fn paths(task: &ResolvedTask) -> Vec<&str> {
        task.input_paths().collect()
    }

    #[test]
    fn scalar_input_becomes_singleton() {
        let g = StaticGlobExpander::new();
        let t = normalize("a", &decl(r#"{"input": "a.js", "output": "a.out"}"#), &g).unwrap();
        assert_eq!(paths(&t), vec!["a.js"]);
        assert!(!t.ready, "literal inputs are finalised by the resolver");
    }

    #[test]
    fn single_glob_input_derives_outputs_positionally() {
        let g = StaticGlobExpander::new().with_pattern("src/*.txt", ["src/a.txt", "src/b.txt"]);
        let t = normalize(
            "convert",
            &decl(
                r#"{
                    "input": "src/*.txt",
                    "output": "build/*.out",
                    "multiCommand": "cp $(input) $(output)"
                }"#,
            ),
            &g,
        )
        .unwrap();

        assert!(t.ready);
        assert_eq!(paths(&t), vec!["src/a.txt", "src/b.txt"]);
        assert_eq!(t.outputs, vec!["build/a.out", "build/b.out"]);
    }

    #[test]
    fn zero_glob_matches_is_ready_and_empty() {
        let t = normalize(
            "convert",
            &decl(r#"{"input": "src/*.txt", "output": "build/*.out"}"#),
            &StaticGlobExpander::new(),
        )
        .unwrap();
        assert!(t.ready);
        assert!(t.inputs.is_empty());
        assert!(t.outputs.is_empty());
    }

    #[test]
    fn glob_with_plain_output_names_one_shared_output() {
        let g = StaticGlobExpander::new().with_pattern("src/*.js", ["src/a.js", "src/b.js"]);
        let t = normalize(
            "bundle",
            &decl(
                r#"{
                    "input": "src/*.js",
                    "output": "dist/app.js",
                    "command": "cat $(inputs) > $(output)"
                }"#,
            ),
            &g,
        )
        .unwrap();
        assert_eq!(t.outputs, vec!["dist/app.js"]);
    }

    #[test]
    fn glob_with_plain_output_and_no_matches_has_no_outputs() {
        let t = normalize(
            "bundle",
            &decl(r#"{"input": "src/*.js", "output": "dist/app.js", "command": "cat $(inputs)"}"#),
            &StaticGlobExpander::new(),
        )
        .unwrap();
        assert!(t.ready);
        assert!(t.outputs.is_empty());
    }

    #[test]
    fn nested_lists_flatten_and_globs_inside_lists_expand() {
        let g = StaticGlobExpander::new().with_pattern("lib/*.js", ["lib/x.js"]);
        let t = normalize(
            "t",
            &decl(r#"{"input": ["a.js", ["lib/*.js", {"task": "other"}]]}"#),
            &g,
        )
        .unwrap();
        assert_eq!(
            t.inputs,
            vec![
                PendingInput::Path("a.js".into()),
                PendingInput::Path("lib/x.js".into()),
                PendingInput::Reference(TaskRef::Single("other".into())),
            ]
        );
        assert!(!t.ready);
    }

    #[test]
    fn reference_forms_are_equivalent() {
        let g = StaticGlobExpander::new();
        for json in [
            r#"{"input": {"tasks": ["a", "b"]}}"#,
            r#"{"input": {"outputs": ["a", "b"]}}"#,
        ] {
            let t = normalize("t", &decl(json), &g).unwrap();
            assert_eq!(
                t.inputs,
                vec![PendingInput::Reference(TaskRef::Many(vec!["a".into(), "b".into()]))]
            );
        }
        let t = normalize("t", &decl(r#"{"input": {"task": "a"}}"#), &g).unwrap();
        assert_eq!(t.inputs, vec![PendingInput::Reference(TaskRef::Single("a".into()))]);
    }

    #[test]
    fn malformed_reference_is_rejected() {
        let g = StaticGlobExpander::new();
        for json in [
            r#"{"input": {"bogus": "a"}}"#,
            r#"{"input": {"task": "a", "tasks": ["b"]}}"#,
            r#"{"input": {"task": 3}}"#,
            r#"{"input": {}}"#,
        ] {
            let err = normalize("t", &decl(json), &g).unwrap_err();
            assert!(matches!(err, ManifestError::MalformedReference { .. }), "{json}: {err:?}");
        }
    }

    #[test]
    fn command_and_multi_command_conflict() {
        let err = normalize(
            "t",
            &decl(r#"{"command": "a", "multiCommand": "b"}"#),
            &StaticGlobExpander::new(),
        )
        .unwrap_err();
        assert_eq!(err, ManifestError::ConflictingCommands { task: "t".into() });
    }

    #[test]
    fn invalid_glob_is_a_manifest_error() {
        let err = normalize("t", &decl(r#"{"input": "src/[oops"}"#), &StaticGlobExpander::new())
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidGlob { .. }));
    }
}
