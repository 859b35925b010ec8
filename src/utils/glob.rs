//! Glob patterns for collection file matching.
//!
//! Patterns are compiled into an anchored regex and matched against
//! `/`-separated paths relative to a collection's base directory.
//!
//! | Syntax    | Matches                                        |
//! |-----------|------------------------------------------------|
//! | `*`       | any run of characters except `/`               |
//! | `?`       | one character except `/`                       |
//! | `**/`     | zero or more whole directories                 |
//! | `**`      | anything, including `/`                        |
//! | `{a,b}`   | either alternative (alternatives may nest)     |
//! | `[abc]`   | one character from the class (`[!..]` negates) |

use regex::Regex;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlobError {
    #[error("unclosed `{delim}` in glob `{pattern}`")]
    Unclosed { pattern: String, delim: char },

    #[error("invalid glob `{pattern}`")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    regex: Regex,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        let source = translate(pattern)?;
        let regex = Regex::new(&source).map_err(|source| GlobError::Regex {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self {
            pattern: pattern.to_owned(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Match a `/`-separated relative path.
    pub fn is_match(&self, relative: &str) -> bool {
        self.regex.is_match(relative)
    }

    /// Match a relative filesystem path, normalizing separators.
    pub fn matches_path(&self, relative: &Path) -> bool {
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        self.is_match(&joined)
    }
}

/// Translate a glob into anchored regex source.
fn translate(pattern: &str) -> Result<String, GlobError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    let mut depth = 0usize;
    let mut i = 0;

    out.push('^');
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                let at_segment_start = i == 0 || chars[i - 1] == '/';
                if at_segment_start && chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:[^/]*/)*");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '{' => {
                depth += 1;
                out.push_str("(?:");
            }
            '}' if depth > 0 => {
                depth -= 1;
                out.push(')');
            }
            ',' if depth > 0 => out.push('|'),
            '[' => {
                let close = chars[i + 1..]
                    .iter()
                    .skip(1)
                    .position(|&c| c == ']')
                    .map(|p| i + 2 + p)
                    .ok_or_else(|| GlobError::Unclosed {
                        pattern: pattern.to_owned(),
                        delim: '[',
                    })?;
                out.push('[');
                let mut class = &chars[i + 1..close];
                if let Some(('!' | '^', rest)) = class.split_first() {
                    out.push('^');
                    class = rest;
                }
                for &c in class {
                    if matches!(c, '\\' | '[' | ']' | '^') {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push(']');
                i = close + 1;
                continue;
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    if depth > 0 {
        return Err(GlobError::Unclosed {
            pattern: pattern.to_owned(),
            delim: '{',
        });
    }

    out.push('$');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_collection_pattern() {
        let glob = Glob::new("**/*.{md,mdx}").unwrap();
        assert!(glob.is_match("first-post.md"));
        assert!(glob.is_match("first-post.mdx"));
        assert!(glob.is_match("2024/jan/first-post.md"));
        assert!(!glob.is_match("first-post.markdown"));
        assert!(!glob.is_match("hero.png"));
        assert!(!glob.is_match("notes.md.bak"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let glob = Glob::new("*.md").unwrap();
        assert!(glob.is_match("post.md"));
        assert!(!glob.is_match("nested/post.md"));
    }

    #[test]
    fn test_question_mark_and_class() {
        let glob = Glob::new("post-?.[mt]d").unwrap();
        assert!(glob.is_match("post-1.md"));
        assert!(glob.is_match("post-a.td"));
        assert!(!glob.is_match("post-12.md"));

        let negated = Glob::new("[!_]*.md").unwrap();
        assert!(negated.is_match("post.md"));
        assert!(!negated.is_match("_draft.md"));
    }

    #[test]
    fn test_literal_dots_are_escaped() {
        let glob = Glob::new("a.md").unwrap();
        assert!(!glob.is_match("abmd"));
    }

    #[test]
    fn test_unclosed_brace() {
        assert!(matches!(
            Glob::new("**/*.{md,mdx"),
            Err(GlobError::Unclosed { delim: '{', .. })
        ));
        assert!(matches!(
            Glob::new("[ab.md"),
            Err(GlobError::Unclosed { delim: '[', .. })
        ));
    }

    #[test]
    fn test_matches_path() {
        let glob = Glob::new("**/*.md").unwrap();
        let path: PathBuf = ["posts", "hello.md"].iter().collect();
        assert!(glob.matches_path(&path));
    }
}
