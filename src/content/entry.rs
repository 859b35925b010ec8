//! Validated content entries.

use chrono::{DateTime, Utc};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Validated front-matter fields, keyed by field name.
///
/// Absent optional fields are absent from the map, never placeholders.
pub type Fields = BTreeMap<String, FieldValue>;

/// A field value after its rule has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(DateTime<Utc>),
    TextList(Vec<String>),
    Image(ImageRef),
}

/// A local image referenced from front-matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// The reference as written in the source file.
    pub src: String,
    /// Resolved location on disk.
    pub path: PathBuf,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
    Avif,
    Svg,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Some(match ext.as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::Webp,
            "gif" => Self::Gif,
            "avif" => Self::Avif,
            "svg" => Self::Svg,
            _ => return None,
        })
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Avif => "avif",
            Self::Svg => "svg",
        }
    }
}

/// Source markup dialect, taken from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Markdown,
    Mdx,
}

impl BodyFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mdx") => Self::Mdx,
            _ => Self::Markdown,
        }
    }
}

/// One validated content item.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Identifier derived from the file path (or the `slug` key).
    pub id: String,
    /// Name of the owning collection.
    pub collection: String,
    /// Source file.
    pub source: PathBuf,
    pub format: BodyFormat,
    pub fields: Fields,
    /// Unvalidated body, verbatim.
    pub body: String,
}

impl Entry {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.fields.get(name) {
            Some(FieldValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.fields.get(name) {
            Some(FieldValue::TextList(items)) => Some(items),
            _ => None,
        }
    }

    pub fn image(&self, name: &str) -> Option<&ImageRef> {
        match self.fields.get(name) {
            Some(FieldValue::Image(image)) => Some(image),
            _ => None,
        }
    }

    /// Title, falling back to the identifier for schemas without one.
    pub fn title(&self) -> &str {
        self.text("title").unwrap_or(&self.id)
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }

    pub fn pub_date(&self) -> Option<DateTime<Utc>> {
        self.date("pubDate")
    }

    pub fn updated_date(&self) -> Option<DateTime<Utc>> {
        self.date("updatedDate")
    }

    /// Most recent of `updatedDate` and `pubDate`.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.updated_date().max(self.pub_date())
    }

    pub fn hero_image(&self) -> Option<&ImageRef> {
        self.image("heroImage")
    }

    /// Identifiers of related entries; unresolved until render time.
    pub fn related(&self) -> &[String] {
        self.list("relatedPosts").unwrap_or_default()
    }

    pub fn link(&self) -> Option<&str> {
        self.text("link")
    }
}
