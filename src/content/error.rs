//! Content loading and validation errors.

use crate::utils::glob::GlobError;
use std::path::PathBuf;
use thiserror::Error;

/// A single front-matter field that failed its rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// A required field is absent.
    #[error("missing required field `{field}`")]
    Missing { field: String },

    /// A field is present but has the wrong type or cannot be coerced.
    #[error("field `{field}`: {reason}")]
    Coercion { field: String, reason: String },
}

impl FieldError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    pub fn coercion(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Coercion {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field } | Self::Coercion { field, .. } => field,
        }
    }
}

/// Errors raised while scanning and validating a collection.
///
/// Every variant is fatal to the build.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to scan `{path}`")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid front-matter in `{path}`: {message}")]
    FrontMatter { path: PathBuf, message: String },

    #[error("`{path}` does not match the schema:\n{}", render_field_errors(.errors))]
    Validation {
        path: PathBuf,
        errors: Vec<FieldError>,
    },

    #[error("collection `{collection}` has two entries with id `{id}`: `{first}` and `{second}`")]
    DuplicateId {
        collection: String,
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("collection `{collection}` is defined twice")]
    DuplicateCollection { collection: String },

    #[error("collection `{collection}` has an invalid pattern")]
    Pattern {
        collection: String,
        #[source]
        source: GlobError,
    },
}

impl ContentError {
    /// Field errors of a validation failure, empty for other variants.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn render_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
