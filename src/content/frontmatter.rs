//! Front-matter extraction.
//!
//! A content file may open with a YAML block between `---` lines:
//!
//! ```text
//! ---
//! title: "Hello"
//! pubDate: 2024-01-01
//! ---
//! Body text.
//! ```
//!
//! The block is parsed into a generic key/value [`Mapping`]; the schema
//! decides what the keys mean.

use serde_yaml::{Mapping, Value};

const DELIMITER: &str = "---";

/// Raw front-matter and body of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter<'a> {
    pub data: Mapping,
    pub body: &'a str,
}

/// Split a source file into its YAML block and body.
///
/// Returns `None` when the file does not open with a delimiter line or the
/// block is never closed.
pub fn split(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = strip_delimiter_line(content)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parse the front-matter of a source file.
///
/// A file without a block yields an empty mapping and the whole file as
/// body. An empty block is an empty mapping.
///
/// # Errors
/// Returns the YAML error message, or a message when the block is not a
/// mapping.
pub fn parse(content: &str) -> Result<FrontMatter<'_>, String> {
    let Some((yaml, body)) = split(content) else {
        return Ok(FrontMatter {
            data: Mapping::new(),
            body: content,
        });
    };

    let data = match serde_yaml::from_str::<Value>(yaml).map_err(|e| e.to_string())? {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(format!(
                "expected a key/value block, found {}",
                describe(&other)
            ));
        }
    };

    Ok(FrontMatter { data, body })
}

/// Consume the opening `---` line.
fn strip_delimiter_line(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(DELIMITER)?;
    let rest = rest.trim_start_matches([' ', '\t']);
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Human-readable YAML type name, used in validation messages.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "array",
        Value::Mapping(_) => "object",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic() {
        let content = "---\ntitle: Hello\n---\nBody text\n";
        let (yaml, body) = split(content).unwrap();
        assert_eq!(yaml, "title: Hello\n");
        assert_eq!(body, "Body text\n");
    }

    #[test]
    fn test_split_crlf() {
        let content = "---\r\ntitle: Hello\r\n---\r\nBody";
        let (yaml, body) = split(content).unwrap();
        assert_eq!(yaml, "title: Hello\r\n");
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_requires_opening_line() {
        assert!(split("title: Hello\n---\n").is_none());
        assert!(split("----\ntitle: x\n---\n").is_none());
    }

    #[test]
    fn test_split_unclosed() {
        assert!(split("---\ntitle: Hello\n").is_none());
    }

    #[test]
    fn test_split_ignores_dashes_inside_values() {
        let content = "---\ntitle: a---b\n---\n---rule---\n";
        let (yaml, body) = split(content).unwrap();
        assert_eq!(yaml, "title: a---b\n");
        assert_eq!(body, "---rule---\n");
    }

    #[test]
    fn test_parse_mapping() {
        let fm = parse("---\ntitle: \"Hello\"\npubDate: 2024-01-01\n---\n# Hi\n").unwrap();
        assert_eq!(fm.data.get("title").and_then(Value::as_str), Some("Hello"));
        assert_eq!(fm.data.get("pubDate").and_then(Value::as_str), Some("2024-01-01"));
        assert_eq!(fm.body, "# Hi\n");
    }

    #[test]
    fn test_parse_no_front_matter() {
        let fm = parse("# Just a body\n").unwrap();
        assert!(fm.data.is_empty());
        assert_eq!(fm.body, "# Just a body\n");
    }

    #[test]
    fn test_parse_empty_block() {
        let fm = parse("---\n---\nBody").unwrap();
        assert!(fm.data.is_empty());
        assert_eq!(fm.body, "Body");
    }

    #[test]
    fn test_parse_rejects_non_mapping() {
        let err = parse("---\n- a\n- b\n---\n").unwrap_err();
        assert!(err.contains("array"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(parse("---\ntitle: [unclosed\n---\n").is_err());
    }
}
