// src/plan/wildcard.rs

//! Positional wildcard capture: `src/*.coffee` + `lib/*.js` turns
//! `src/app.coffee` into `lib/app.js`.

use regex::Regex;

/// Whether an output template still has a placeholder to fill.
pub fn has_placeholder(template: &str) -> bool {
    template.contains('*') || template.contains("$1")
}

/// Captures the text matched by the first wildcard of a glob pattern.
#[derive(Debug, Clone)]
pub struct WildcardCapture {
    regex: Regex,
}

impl WildcardCapture {
    /// Compile `pattern` into an anchored regex whose first group is the
    /// first wildcard. Later wildcards still match but are not captured.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&glob_to_regex(pattern))?;
        Ok(Self { regex })
    }

    /// The captured text for `path`, or `None` if it does not match.
    pub fn capture<'p>(&self, path: &'p str) -> Option<&'p str> {
        let caps = self.regex.captures(path)?;
        Some(caps.get(1).map_or("", |m| m.as_str()))
    }

    /// Fill `template` with the capture from `path`. The first `*` (or `$1`)
    /// in the template is replaced.
    pub fn apply(&self, path: &str, template: &str) -> Option<String> {
        let captured = self.capture(path)?;
        let filled = if template.contains('*') {
            template.replacen('*', captured, 1)
        } else {
            template.replacen("$1", captured, 1)
        };
        Some(filled)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut captured = false;
    let mut chars = pattern.chars().peekable();

    let mut group = |body: &str, out: &mut String| {
        if captured {
            out.push_str(&format!("(?:{body})"));
        } else {
            captured = true;
            out.push_str(&format!("({body})"));
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    // `**/` may match zero directories.
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        group("(?:.*/)?", &mut out);
                    } else {
                        group(".*", &mut out);
                    }
                } else {
                    group("[^/]*", &mut out);
                }
            }
            '?' => out.push_str("[^/]"),
            '[' => {
                out.push('[');
                if chars.peek() == Some(&'!') {
                    chars.next();
                    out.push('^');
                }
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                    if c == '\\' || c == '[' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_star_in_template() {
        let w = WildcardCapture::new("src/*.txt").unwrap();
        assert_eq!(w.apply("src/a.txt", "build/*.out").as_deref(), Some("build/a.out"));
    }

    #[test]
    fn fills_dollar_one_in_template() {
        let w = WildcardCapture::new("src/*.coffee").unwrap();
        assert_eq!(w.apply("src/app.coffee", "lib/$1.js").as_deref(), Some("lib/app.js"));
    }

    #[test]
    fn dots_in_pattern_are_literal() {
        let w = WildcardCapture::new("*.txt").unwrap();
        assert_eq!(w.capture("atxt"), None);
        assert_eq!(w.capture("a.txt"), Some("a"));
    }

    #[test]
    fn only_first_wildcard_is_captured() {
        let w = WildcardCapture::new("src/*/*.rs").unwrap();
        assert_eq!(w.capture("src/core/lib.rs"), Some("core"));
    }

    #[test]
    fn double_star_captures_subpath() {
        let w = WildcardCapture::new("src/**/*.rs").unwrap();
        assert_eq!(w.capture("src/a/b/lib.rs"), Some("a/b/"));
        assert_eq!(w.capture("src/lib.rs"), Some(""));
    }

    #[test]
    fn placeholder_detection() {
        assert!(has_placeholder("build/*.out"));
        assert!(has_placeholder("lib/$1.js"));
        assert!(!has_placeholder("dist/app.js"));
    }
}
