#![allow(dead_code)]

use std::collections::BTreeMap;

use rube::glob::StaticGlobExpander;
use rube::manifest::{Manifest, RawInput, RawOutput, TaskDeclaration};
use rube::plan::{self, BuildPlan};

/// Builder for `Manifest` to simplify test setup. Tasks keep the order they
/// are added in.
#[derive(Default)]
pub struct ManifestBuilder {
    tasks: Vec<(String, TaskDeclaration)>,
    globs: StaticGlobExpander,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, name: &str, task: TaskDeclaration) -> Self {
        self.tasks.push((name.to_string(), task));
        self
    }

    /// Make `pattern` expand to `paths` when the manifest is planned.
    pub fn with_glob(mut self, pattern: &str, paths: &[&str]) -> Self {
        self.globs = self.globs.with_pattern(pattern, paths.iter().copied());
        self
    }

    pub fn build(self) -> Manifest {
        Manifest::new(self.tasks)
    }

    /// Plan the manifest against the registered glob table.
    pub fn plan(self) -> BuildPlan {
        let globs = self.globs.clone();
        plan::plan(&self.build(), &globs).expect("Failed to plan manifest from builder")
    }
}

/// Builder for `TaskDeclaration`.
#[derive(Default)]
pub struct TaskBuilder {
    inputs: Vec<RawInput>,
    task: TaskDeclaration,
}

impl TaskBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `input -> output` through `cmd`, the common one-file step.
    pub fn file_step(input: &str, output: &str, cmd: &str) -> TaskDeclaration {
        Self::new().input(input).output(output).command(cmd).build()
    }

    /// `{"task": producer} -> output` through `cmd`.
    pub fn after(producer: &str, output: &str, cmd: &str) -> TaskDeclaration {
        Self::new()
            .reference_task(producer)
            .output(output)
            .command(cmd)
            .build()
    }

    /// Add a literal path or glob pattern to the input list.
    pub fn input(mut self, path: &str) -> Self {
        self.inputs.push(RawInput::Path(path.to_string()));
        self
    }

    /// Add `{"task": name}` to the input list.
    pub fn reference_task(mut self, name: &str) -> Self {
        self.inputs.push(reference("task", serde_json::json!(name)));
        self
    }

    /// Add `{"tasks": [names]}` to the input list.
    pub fn reference_tasks(mut self, names: &[&str]) -> Self {
        self.inputs.push(reference("tasks", serde_json::json!(names)));
        self
    }

    pub fn output(mut self, template: &str) -> Self {
        self.task.output = Some(RawOutput::Template(template.to_string()));
        self
    }

    pub fn outputs(mut self, paths: &[&str]) -> Self {
        self.task.output = Some(RawOutput::Paths(paths.iter().map(|p| p.to_string()).collect()));
        self
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.task.command = Some(cmd.to_string());
        self
    }

    pub fn multi_command(mut self, cmd: &str) -> Self {
        self.task.multi_command = Some(cmd.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.task.description = Some(text.to_string());
        self
    }

    /// A single input stays a scalar, so a lone glob still derives outputs
    /// the way a manifest string would.
    pub fn build(mut self) -> TaskDeclaration {
        self.task.input = match self.inputs.len() {
            0 => None,
            1 => self.inputs.pop(),
            _ => Some(RawInput::List(self.inputs)),
        };
        self.task
    }
}

fn reference(key: &str, value: serde_json::Value) -> RawInput {
    RawInput::Reference(BTreeMap::from([(key.to_string(), value)]))
}
