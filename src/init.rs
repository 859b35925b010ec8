//! Site initialization module.
//!
//! Creates a new site with the two standard collections, a sample entry
//! in each, and a default configuration.

use crate::{
    config::SiteConfig,
    content::{BLOG, PROJECTS},
};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

const SAMPLE_POST: &str = r#"---
title: "Hello, world"
description: "The first post on this blog."
pubDate: "2024-01-01"
relatedPosts: []
---

Welcome! Posts live in `src/content/blog/` and are checked against the
blog schema on every build.
"#;

const SAMPLE_PROJECT: &str = r#"---
title: "This site"
description: "A static blog built from Markdown collections."
pubDate: "2024-01-01"
link: "https://example.com"
---

Projects live in `src/content/projects/`.
"#;

/// Create a new site with default structure
pub fn new_site(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    // Without a name the site goes into the current directory, which must be empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `devblog init <SITE_NAME>` to create in a subdirectory."
        );
    }

    let content = &config.build.content;
    let dirs = [
        content.join(BLOG),
        content.join(PROJECTS),
        config.build.public.clone(),
        config.build.islands.dir.clone(),
    ];
    init_site_structure(&dirs)?;
    write_new(&content.join(BLOG).join("hello-world.md"), SAMPLE_POST)?;
    write_new(&content.join(PROJECTS).join("this-site.md"), SAMPLE_PROJECT)?;
    init_default_config(&config.config_path)?;
    init_ignored_files(root, &[&relative_to(root, &config.build.output)])?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Starter configuration written by `init`.
fn starter_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.base.title = "DevBlog".into();
    config.base.description = "A developer blog".into();
    config.base.url = Some("https://example.com".into());
    config
}

/// Write default configuration file
fn init_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&starter_config())?;
    write_new(path, &content)
}

/// Create site directory structure
fn init_site_structure(dirs: &[impl AsRef<Path>]) -> Result<()> {
    for dir in dirs {
        let path = dir.as_ref();
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `devblog init <SITE_NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

fn write_new(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        bail!("`{}` already exists", path.display());
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn relative_to(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    format!("/{}/", relative.display())
}

/// Initialize .gitignore and .ignore files with specified paths
fn init_ignored_files(root: &Path, paths: &[&str]) -> Result<()> {
    let content = paths.join("\n") + "\n";

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }

    Ok(())
}
