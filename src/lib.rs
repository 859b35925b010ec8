//! DevBlog - a static site generator for Markdown content collections.
//!
//! Content lives in typed collections (`blog`, `projects`) whose
//! front-matter is validated against a schema. A build renders every
//! entry through an ordered stage pipeline, writes the output directory,
//! and finally runs an external search indexer over it.

pub mod cli;
pub mod config;
pub mod content;
pub mod init;
pub mod pipeline;
pub mod utils;
