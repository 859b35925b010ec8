//! The site's collection registry.
//!
//! Two collections are always defined: `blog` and `projects`, both reading
//! `<content>/<name>/**/*.{md,mdx}`.

use super::{
    collection::Collection,
    entry::Entry,
    error::ContentError,
    schema::{FieldKind, FieldRule, ImageResolver, Schema, SchemaHelpers},
};
use crate::log;
use std::path::Path;

pub const BLOG: &str = "blog";
pub const PROJECTS: &str = "projects";

/// Source files every collection picks up.
pub const CONTENT_PATTERN: &str = "**/*.{md,mdx}";

/// Blog posts.
pub fn blog_schema(helpers: &SchemaHelpers) -> Schema {
    Schema::new(vec![
        FieldRule::required("title", FieldKind::Text),
        FieldRule::required("description", FieldKind::Text),
        FieldRule::required("pubDate", FieldKind::Date),
        FieldRule::optional("updatedDate", FieldKind::Date),
        FieldRule::optional("heroImage", helpers.image()),
        FieldRule::optional("relatedPosts", FieldKind::TextList),
    ])
}

/// Project showcase entries.
pub fn projects_schema(helpers: &SchemaHelpers) -> Schema {
    Schema::new(vec![
        FieldRule::required("title", FieldKind::Text),
        FieldRule::required("description", FieldKind::Text),
        FieldRule::required("pubDate", FieldKind::Date),
        FieldRule::optional("heroImage", helpers.image()),
        FieldRule::optional("link", FieldKind::Text),
    ])
}

/// Collections in declaration order, unique by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    collections: Vec<Collection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `blog` and `projects` collections under `content_root`.
    pub fn standard(content_root: &Path) -> Result<Self, ContentError> {
        let mut registry = Self::new();
        registry.define(Collection::define(
            BLOG,
            content_root.join(BLOG),
            CONTENT_PATTERN,
            blog_schema,
        )?)?;
        registry.define(Collection::define(
            PROJECTS,
            content_root.join(PROJECTS),
            CONTENT_PATTERN,
            projects_schema,
        )?)?;
        Ok(registry)
    }

    /// Register a collection; names are unique.
    pub fn define(&mut self, collection: Collection) -> Result<&mut Self, ContentError> {
        if self.get(collection.name()).is_some() {
            return Err(ContentError::DuplicateCollection {
                collection: collection.name().to_owned(),
            });
        }
        self.collections.push(collection);
        Ok(self)
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name() == name)
    }

    /// Load every collection, stopping at the first failure.
    pub fn load_all(&self, images: &ImageResolver) -> Result<SiteContent, ContentError> {
        let mut content = SiteContent::default();
        for collection in &self.collections {
            let entries = collection.load(images)?;
            log!("content"; "{}: {} entries", collection.name(), entries.len());
            content.collections.push((collection.name().to_owned(), entries));
        }
        Ok(content)
    }
}

/// Loaded entries of every collection, in registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteContent {
    collections: Vec<(String, Vec<Entry>)>,
}

impl SiteContent {
    /// Entries of `name`; an unknown collection has none.
    pub fn get(&self, name: &str) -> &[Entry] {
        self.collections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Entry])> {
        self.collections
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    /// Every entry of every collection.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.collections.iter().flat_map(|(_, entries)| entries)
    }

    pub fn total(&self) -> usize {
        self.collections.iter().map(|(_, entries)| entries.len()).sum()
    }

    pub fn find(&self, collection: &str, id: &str) -> Option<&Entry> {
        self.get(collection).iter().find(|entry| entry.id == id)
    }
}

impl FromIterator<(String, Vec<Entry>)> for SiteContent {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Entry>)>>(iter: I) -> Self {
        Self {
            collections: iter.into_iter().collect(),
        }
    }
}
