// src/plan/template.rs

//! Command-template substitution.
//!
//! Recognised placeholders:
//! - `$(input)` / `$(inputs)`: all inputs, space-joined
//! - `$(inputs,)`: all inputs, comma-joined
//! - `$(output)`: the output path
//!
//! Anything else that looks like `$(name)` is left verbatim.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::types::Artifact;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\$\((inputs,|inputs|input|output)\)").expect("PLACEHOLDER_REGEX is valid")
    })
}

/// Substitute the placeholders of `template` for one work item.
///
/// An aggregate output has no path, so `$(output)` stays as written for it.
pub fn substitute(template: &str, inputs: &[String], output: &Artifact) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "input" | "inputs" => inputs.join(" "),
            "inputs," => inputs.join(","),
            _ => match output.as_path() {
                Some(path) => path.to_string(),
                None => caps[0].to_string(),
            },
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn substitutes_all_known_placeholders() {
        let out = Artifact::Path("dist/app.js".into());
        let inputs = ins(&["a.js", "b.js"]);
        assert_eq!(
            substitute("cat $(inputs) > $(output) # $(inputs,) $(input)", &inputs, &out),
            "cat a.js b.js > dist/app.js # a.js,b.js a.js b.js"
        );
    }

    #[test]
    fn unknown_tokens_are_left_alone() {
        let out = Artifact::Path("o".into());
        assert_eq!(substitute("echo $(HOME) $(output)", &ins(&[]), &out), "echo $(HOME) o");
    }

    #[test]
    fn aggregate_output_keeps_the_token() {
        let out = Artifact::Aggregate("all".into());
        assert_eq!(substitute("echo $(output)", &ins(&["x"]), &out), "echo $(output)");
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let out = Artifact::Path("$(input)".into());
        assert_eq!(substitute("$(output) $(input)", &ins(&["a"]), &out), "$(input) a");
    }
}
