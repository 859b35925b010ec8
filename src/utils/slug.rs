//! URL slugification.
//!
//! Entry identifiers and heading anchors share one slug rule: lowercase,
//! whitespace becomes `-`, punctuation is dropped, letters and digits of any
//! script are kept.

use std::path::Path;

/// Convert free text to a URL-safe slug.
///
/// ```ignore
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// ```
pub fn slugify(text: &str) -> String {
    text.trim()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                Some(c.to_lowercase().collect::<String>())
            } else if c.is_whitespace() {
                Some("-".to_owned())
            } else {
                None
            }
        })
        .collect()
}

/// Derive an entry identifier from a path relative to the collection base.
///
/// The extension is removed, every segment is slugified, and a trailing
/// `index` segment collapses into its directory.
///
/// | Relative path              | Identifier         |
/// |----------------------------|--------------------|
/// | `first-post.md`            | `first-post`       |
/// | `2024/My Post.mdx`         | `2024/my-post`     |
/// | `series/index.md`          | `series`           |
pub fn slugify_id(relative: &Path) -> String {
    let without_ext = relative.with_extension("");
    let mut segments: Vec<String> = without_ext
        .components()
        .map(|c| slugify(&c.as_os_str().to_string_lossy()))
        .filter(|s| !s.is_empty())
        .collect();

    if segments.len() > 1 && segments.last().is_some_and(|s| s == "index") {
        segments.pop();
    }

    segments.join("/")
}
