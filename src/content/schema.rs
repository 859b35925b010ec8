//! Front-matter schemas.
//!
//! A [`Schema`] is an ordered list of [`FieldRule`]s. Validation folds the
//! rules over a parsed front-matter mapping and yields either the typed
//! [`Fields`] of an entry or every [`FieldError`] found in the file.
//!
//! ```ignore
//! let schema = Schema::new(vec![
//!     FieldRule::required("title", FieldKind::Text),
//!     FieldRule::required("pubDate", FieldKind::Date),
//!     FieldRule::optional("heroImage", helpers.image()),
//! ]);
//! ```

use super::{
    entry::{FieldValue, Fields, ImageFormat, ImageRef},
    error::FieldError,
    frontmatter::describe,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

// ============================================================================
// Rules
// ============================================================================

/// Primitive type of a field, with its coercion behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string; other scalars are rejected, not converted.
    Text,
    /// A date; strings and epoch milliseconds are coerced.
    Date,
    /// A list of strings.
    TextList,
    /// A local image path, resolved and checked on disk.
    Image,
}

impl FieldKind {
    const fn expected(self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Date => "date",
            Self::TextList => "array",
            Self::Image => "image path",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Utilities handed to schema constructors.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaHelpers;

impl SchemaHelpers {
    /// Field kind for a local image reference.
    pub const fn image(&self) -> FieldKind {
        FieldKind::Image
    }
}

// ============================================================================
// Image Resolution
// ============================================================================

/// Resolves image references found in front-matter.
///
/// Relative references resolve against the directory of the entry file;
/// references starting with `/` resolve against the public directory.
#[derive(Debug, Clone, Default)]
pub struct ImageResolver {
    public_dir: PathBuf,
}

impl ImageResolver {
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
        }
    }

    pub fn resolve(&self, src: &str, entry_file: &Path) -> Result<ImageRef, String> {
        if src.contains("://") {
            return Err(format!("`{src}` is a remote URL, expected a local image"));
        }

        let path = match src.strip_prefix('/') {
            Some(public) => self.public_dir.join(public),
            None => entry_file
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(src),
        };

        let format = ImageFormat::from_path(&path)
            .ok_or_else(|| format!("`{src}` is not a supported image format"))?;

        if !path.is_file() {
            return Err(format!("image `{src}` not found at `{}`", path.display()));
        }

        Ok(ImageRef {
            src: src.to_owned(),
            path,
            format,
        })
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Ordered field rules for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    rules: Vec<FieldRule>,
}

impl Schema {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Apply every rule to `data`.
    ///
    /// Keys without a rule are dropped. All failing fields are reported,
    /// in rule order.
    pub fn validate(
        &self,
        data: &Mapping,
        entry_file: &Path,
        images: &ImageResolver,
    ) -> Result<Fields, Vec<FieldError>> {
        let (fields, errors) = self.rules.iter().fold(
            (Fields::new(), Vec::new()),
            |(mut fields, mut errors), rule| {
                match data.get(rule.name) {
                    None if rule.required => errors.push(FieldError::missing(rule.name)),
                    None => {}
                    Some(value) => match apply(rule.kind, value, entry_file, images) {
                        Ok(value) => {
                            fields.insert(rule.name.to_owned(), value);
                        }
                        Err(reason) => errors.push(FieldError::coercion(rule.name, reason)),
                    },
                }
                (fields, errors)
            },
        );

        if errors.is_empty() {
            Ok(fields)
        } else {
            Err(errors)
        }
    }
}

/// Apply one field kind to a raw value.
fn apply(
    kind: FieldKind,
    value: &Value,
    entry_file: &Path,
    images: &ImageResolver,
) -> Result<FieldValue, String> {
    match (kind, value) {
        (FieldKind::Text, Value::String(s)) => Ok(FieldValue::Text(s.clone())),
        (FieldKind::Date, value) => coerce_date(value).map(FieldValue::Date),
        (FieldKind::TextList, Value::Sequence(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(format!(
                    "expected string at index {i}, received {}",
                    describe(other)
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::TextList),
        (FieldKind::Image, Value::String(src)) => {
            images.resolve(src, entry_file).map(FieldValue::Image)
        }
        (kind, other) => Err(format!(
            "expected {}, received {}",
            kind.expected(),
            describe(other)
        )),
    }
}

// ============================================================================
// Date Coercion
// ============================================================================

/// Naive date-time layouts, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts, interpreted as midnight UTC.
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%b %d %Y", "%B %d, %Y", "%b %d, %Y"];

/// Coerce a raw front-matter value into a UTC timestamp.
///
/// Strings accept RFC 3339, RFC 2822, ISO dates with optional time, and
/// `Jul 08 2022` / `July 8, 2022` forms. Numbers are milliseconds since
/// the Unix epoch. The result depends only on the input.
///
/// `null` is an error rather than the epoch, so an optional date left blank
/// must be omitted instead.
pub fn coerce_date(value: &Value) -> Result<DateTime<Utc>, String> {
    match value {
        Value::String(s) => {
            parse_date(s.trim()).ok_or_else(|| format!("invalid date `{s}`"))
        }
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| format!("invalid date `{n}`")),
        other => Err(format!("expected date, received {}", describe(other))),
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.and_utc());
    }
    if let Some(date) = NAIVE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// Tests
// ============================================================================
