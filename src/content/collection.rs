//! Collections: a base directory, a glob, and a schema.
//!
//! Loading a collection is all-or-nothing: every matched file either
//! becomes an [`Entry`] or the whole load fails with the first invalid
//! file's error. No file is ever skipped silently.

use super::{
    entry::{BodyFormat, Entry},
    error::{ContentError, FieldError},
    frontmatter,
    schema::{ImageResolver, Schema, SchemaHelpers},
};
use crate::utils::{glob::Glob, slug::slugify_id};
use rayon::prelude::*;
use serde_yaml::Value;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Front-matter key that overrides the path-derived identifier.
const SLUG_KEY: &str = "slug";

/// A named set of content files sharing a schema and a location.
#[derive(Debug, Clone)]
pub struct Collection {
    name: String,
    base: PathBuf,
    pattern: Glob,
    schema: Schema,
}

impl Collection {
    /// Declare a collection.
    ///
    /// `schema` receives the [`SchemaHelpers`] and returns the field rules.
    ///
    /// # Errors
    /// Fails when `pattern` is not a valid glob.
    pub fn define<F>(
        name: impl Into<String>,
        base: impl Into<PathBuf>,
        pattern: &str,
        schema: F,
    ) -> Result<Self, ContentError>
    where
        F: FnOnce(&SchemaHelpers) -> Schema,
    {
        let name = name.into();
        let pattern = Glob::new(pattern).map_err(|source| ContentError::Pattern {
            collection: name.clone(),
            source,
        })?;

        Ok(Self {
            name,
            base: base.into(),
            pattern,
            schema: schema(&SchemaHelpers),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Enumerate matching files in file-name order.
    ///
    /// A missing base directory is an empty collection.
    pub fn files(&self) -> Result<Vec<PathBuf>, ContentError> {
        if !self.base.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.base)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| ContentError::Walk {
                path: self.base.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            let matched = path
                .strip_prefix(&self.base)
                .is_ok_and(|relative| self.pattern.matches_path(relative));
            if matched {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Scan, parse, and validate every matching file.
    ///
    /// Files are validated in parallel; the returned order is the
    /// enumeration order of [`Collection::files`].
    pub fn load(&self, images: &ImageResolver) -> Result<Vec<Entry>, ContentError> {
        let files = self.files()?;

        let entries = files
            .par_iter()
            .map(|path| self.load_file(path, images))
            .collect::<Result<Vec<_>, _>>()?;

        self.check_unique_ids(&entries)?;
        Ok(entries)
    }

    /// Parse and validate a single file of this collection.
    pub fn load_file(&self, path: &Path, images: &ImageResolver) -> Result<Entry, ContentError> {
        let content =
            fs::read_to_string(path).map_err(|err| ContentError::Io(path.to_path_buf(), err))?;
        let parsed = frontmatter::parse(&content).map_err(|message| ContentError::FrontMatter {
            path: path.to_path_buf(),
            message,
        })?;

        let validated = self.schema.validate(&parsed.data, path, images);
        let id = self.entry_id(path, parsed.data.get(SLUG_KEY));

        match (validated, id) {
            (Ok(fields), Ok(id)) => Ok(Entry {
                id,
                collection: self.name.clone(),
                source: path.to_path_buf(),
                format: BodyFormat::from_path(path),
                fields,
                body: parsed.body.to_owned(),
            }),
            (validated, id) => {
                let mut errors = validated.err().unwrap_or_default();
                errors.extend(id.err());
                Err(ContentError::Validation {
                    path: path.to_path_buf(),
                    errors,
                })
            }
        }
    }

    /// Identifier from the `slug` key, else from the path relative to base.
    ///
    /// The identifier becomes part of the output path, so it must be made of
    /// plain, non-empty segments.
    fn entry_id(&self, path: &Path, slug: Option<&Value>) -> Result<String, FieldError> {
        match slug {
            Some(Value::String(slug)) => {
                let slug = slug.trim_matches('/');
                match slug.split('/').find(|segment| !is_plain_segment(segment)) {
                    Some(segment) => Err(FieldError::coercion(
                        SLUG_KEY,
                        format!("invalid path segment `{segment}` in `{slug}`"),
                    )),
                    None => Ok(slug.to_owned()),
                }
            }
            Some(other) => Err(FieldError::coercion(
                SLUG_KEY,
                format!(
                    "expected non-empty string, received {}",
                    frontmatter::describe(other)
                ),
            )),
            None => {
                let relative = path.strip_prefix(&self.base).unwrap_or(path);
                match slugify_id(relative) {
                    id if id.is_empty() => Err(FieldError::coercion(
                        SLUG_KEY,
                        format!(
                            "`{}` has no usable characters for an identifier",
                            relative.display()
                        ),
                    )),
                    id => Ok(id),
                }
            }
        }
    }

    fn check_unique_ids(&self, entries: &[Entry]) -> Result<(), ContentError> {
        let mut seen: HashMap<&str, &Path> = HashMap::with_capacity(entries.len());
        for entry in entries {
            if let Some(first) = seen.insert(&entry.id, &entry.source) {
                return Err(ContentError::DuplicateId {
                    collection: self.name.clone(),
                    id: entry.id.clone(),
                    first: first.to_path_buf(),
                    second: entry.source.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A segment that stays inside its parent directory when joined.
fn is_plain_segment(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..") && !segment.contains(['\\', ':'])
}
