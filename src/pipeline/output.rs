//! Output materialization.
//!
//! Writes everything the rendering stages produced:
//!
//! 1. clear the output directory when `clean` is set
//! 2. copy `public/` verbatim
//! 3. copy registered files (hero images, island bundles)
//! 4. lay out, minify, and write every page
//! 5. write generated files (sitemaps)
//!
//! Later steps overwrite earlier ones on a path clash.

use super::{BuildContext, render};
use crate::{
    log,
    utils::minify::{MinifyType, minify},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Files never copied from `public/`.
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Write the site and return the number of files written.
pub fn write(ctx: &BuildContext) -> Result<usize> {
    let config = ctx.config;
    let output = &config.build.output;

    prepare_output(output, config.build.clean)?;

    let mut written = copy_public(&config.build.public, output)?;

    for (dest, source) in &ctx.copies {
        copy_file(source, &output.join(dest))?;
    }
    written += ctx.copies.len();

    ctx.pages.par_iter().try_for_each(|page| {
        let html = render::layout(config, &ctx.scripts, page);
        let html = minify(MinifyType::Html(html.as_bytes()), config);
        write_file(&output.join(page.output_path()), &html)
    })?;
    written += ctx.pages.len();

    for (dest, bytes) in &ctx.files {
        write_file(&output.join(dest), bytes)?;
    }
    written += ctx.files.len();

    log_build_result(output, written);
    Ok(written)
}

/// Create the output directory, removing it first when `clean` is set.
fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

/// Copy the public directory tree into `output`.
fn copy_public(public: &Path, output: &Path) -> Result<usize> {
    let files = collect_all_files(public);
    files.par_iter().try_for_each(|path| {
        let relative = path.strip_prefix(public)?;
        copy_file(path, &output.join(relative))
    })?;
    Ok(files.len())
}

/// Collect all files from a directory recursively, in file-name order.
fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.into_path())
        .collect()
}

fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest).with_context(|| {
        format!("Failed to copy {} to {}", source.display(), dest.display())
    })?;
    Ok(())
}

fn write_file(dest: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, bytes).with_context(|| format!("Failed to write {}", dest.display()))
}

fn log_build_result(output: &Path, written: usize) {
    if written == 0 {
        log!("warn"; "output is empty, check if content has .md or .mdx files");
    } else {
        log!("build"; "wrote {} files to {}", written, output.display());
    }
}
