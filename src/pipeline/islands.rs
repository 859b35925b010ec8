//! UI-framework islands.
//!
//! Interactive components are bundled ahead of time into `<islands.dir>`.
//! The directory is shipped under `/_islands/`, and when it has an
//! `index.js` entry point every page loads it as a module script.

use super::BuildContext;
use crate::log;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Output directory for island assets.
pub const ISLANDS_DIR: &str = "_islands";

/// Entry point loaded on every page.
const ENTRY: &str = "index.js";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandsStage {
    dir: PathBuf,
}

impl IslandsStage {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn run(&self, ctx: &mut BuildContext) -> Result<()> {
        if !self.dir.is_dir() {
            log!("islands"; "no bundle at {}, skipping", self.dir.display());
            return Ok(());
        }

        let mut count = 0;
        for entry in WalkDir::new(&self.dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to scan {}", self.dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&self.dir)?;
            ctx.copies
                .insert(Path::new(ISLANDS_DIR).join(relative), entry.path().to_path_buf());
            count += 1;
        }

        if self.dir.join(ENTRY).is_file() {
            ctx.scripts.push(format!("/{ISLANDS_DIR}/{ENTRY}"));
        }

        log!("islands"; "{count} files");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SiteConfig, content::SiteContent};
    use std::fs;

    #[test]
    fn test_missing_dir_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::default();
        let mut ctx = BuildContext::new(&config, SiteContent::default());

        IslandsStage::new(&dir.path().join("islands")).run(&mut ctx).unwrap();
        assert!(ctx.copies.is_empty());
        assert!(ctx.scripts.is_empty());
    }

    #[test]
    fn test_copies_bundle_and_registers_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.js"), "export {}").unwrap();
        fs::create_dir_all(dir.path().join("chunks")).unwrap();
        fs::write(dir.path().join("chunks/counter.js"), "").unwrap();

        let config = SiteConfig::default();
        let mut ctx = BuildContext::new(&config, SiteContent::default());
        IslandsStage::new(dir.path()).run(&mut ctx).unwrap();

        let dests: Vec<_> = ctx.copies.keys().cloned().collect();
        assert_eq!(
            dests,
            [
                PathBuf::from("_islands/chunks/counter.js"),
                PathBuf::from("_islands/index.js")
            ]
        );
        assert_eq!(ctx.scripts, ["/_islands/index.js"]);
    }

    #[test]
    fn test_no_entry_point_no_script() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("widget.js"), "").unwrap();

        let config = SiteConfig::default();
        let mut ctx = BuildContext::new(&config, SiteContent::default());
        IslandsStage::new(dir.path()).run(&mut ctx).unwrap();

        assert_eq!(ctx.copies.len(), 1);
        assert!(ctx.scripts.is_empty());
    }
}
