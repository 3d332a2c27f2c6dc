//! Glob and regex expansion against a file-tree snapshot.

use globset::GlobBuilder;
use regex::Regex;

use crate::error::PatternError;

/// How a pattern string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Shell-style wildcards matched against the full path.
    ///
    /// Only `*`, `?`, `[...]` and `[!...]` are special and `*` crosses `/`.
    /// Braces, backslashes and an unclosed `[` match themselves; there is no
    /// `{a,b}` alternation and `**` is the same as `*`.
    Glob,
    /// Unanchored regular expression search.
    Regex,
}

impl PatternKind {
    /// Short label for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Glob => "glob",
            Self::Regex => "regex",
        }
    }
}

/// Return the paths of `tree` matching `pattern`, in tree order.
///
/// No match is an empty vector, not an error.
///
/// # Errors
///
/// Returns [`PatternError`] if the pattern does not compile.
pub fn expand_pattern(
    tree: &[String],
    pattern: &str,
    kind: PatternKind,
) -> Result<Vec<String>, PatternError> {
    let matched = match kind {
        PatternKind::Glob => {
            let matcher = GlobBuilder::new(&shell_to_glob(pattern))
                .literal_separator(false)
                .backslash_escape(false)
                .build()
                .map_err(|e| PatternError::new(pattern, e.kind()))?
                .compile_matcher();
            tree.iter()
                .filter(|path| matcher.is_match(path.as_str()))
                .cloned()
                .collect()
        }
        PatternKind::Regex => {
            let regex = Regex::new(pattern).map_err(|e| PatternError::new(pattern, e))?;
            tree.iter()
                .filter(|path| regex.is_match(path))
                .cloned()
                .collect()
        }
    };

    Ok(matched)
}

/// Rewrite a shell wildcard pattern into globset syntax with the same meaning.
fn shell_to_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            '[' => match class_end(&chars, i + 1) {
                Some(end) => {
                    out.push('[');
                    out.extend(&chars[i + 1..end]);
                    out.push(']');
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            c => out.push(c),
        }
        i += 1;
    }

    out
}

/// Index of the `]` closing a class whose body starts at `start`.
///
/// A leading `!` and a `]` right after it belong to the body.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}
