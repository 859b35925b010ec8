//! Utility modules for the static site generator.

pub mod exec;
pub mod glob;
pub mod log;
pub mod minify;
pub mod slug;
