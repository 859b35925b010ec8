//! Content collections.
//!
//! Source files under `<content>/<collection>/` are scanned, their
//! front-matter validated against the collection schema, and turned into
//! [`Entry`] values for rendering. Any invalid file fails the whole load.

mod collection;
mod entry;
mod error;
pub mod frontmatter;
mod registry;
mod schema;

pub use collection::Collection;
pub use entry::{BodyFormat, Entry, FieldValue, Fields, ImageFormat, ImageRef};
pub use error::{ContentError, FieldError};
pub use registry::{
    BLOG, CONTENT_PATTERN, PROJECTS, Registry, SiteContent, blog_schema, projects_schema,
};
pub use schema::{FieldKind, FieldRule, ImageResolver, Schema, SchemaHelpers, coerce_date};
