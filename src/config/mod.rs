//! Site configuration management for `devblog.toml`.
//!
//! # Sections
//!
//! | Section            | Purpose                                       |
//! |--------------------|-----------------------------------------------|
//! | `[base]`           | Site metadata (title, description, url)       |
//! | `[build]`          | Paths, minify, clean                          |
//! | `[build.markup]`   | Ordered markup plugin list                    |
//! | `[build.sitemap]`  | Sitemap emission                              |
//! | `[build.islands]`  | UI-framework island assets                    |
//! | `[build.search]`   | Post-build search indexer (command, timeout)  |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "DevBlog"
//! description = "A developer blog"
//! url = "https://blog.example.com"
//!
//! [build]
//! output = "dist"
//!
//! [build.markup]
//! plugins = ["mdx", "gfm", "heading-ids"]
//!
//! [build.search]
//! command = ["npx", "pagefind", "--site"]
//! timeout = 300
//! ```

mod base;
mod build;
pub mod defaults;
mod error;

pub use base::BaseConfig;
pub use build::{
    BuildConfig, IslandsConfig, MarkupConfig, MarkupPlugin, SearchConfig, SitemapConfig,
};
pub use error::ConfigError;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing devblog.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config = Self::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let base = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => base.join(name),
            _ => base,
        };

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        if let Commands::Build { build_args } = &cli.command {
            self.build.clean |= build_args.clean;
            Self::update_option(&mut self.build.minify, build_args.minify.as_ref());
            Self::update_option(&mut self.build.sitemap.enable, build_args.sitemap.as_ref());
            Self::update_option(&mut self.build.search.enable, build_args.search.as_ref());
            if build_args.base_url.is_some() {
                self.base.url = build_args.base_url.clone();
            }
        }

        self.update_path_with_root(&root);
        self.config_path = Self::normalize_path(&self.get_root().join(&cli.config));
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve every directory against the root and normalize to absolute paths
    pub fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.public = Self::normalize_path(&root.join(&self.build.public));
        self.build.islands.dir = Self::normalize_path(&root.join(&self.build.islands.dir));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self, command: &Commands) -> Result<()> {
        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::invalid(
                "[base.url]",
                "must start with http:// or https://"
            ));
        }

        let Commands::Build { .. } = command else {
            return Ok(());
        };

        if self.build.sitemap.enable && self.base.url.is_none() {
            bail!(ConfigError::invalid(
                "[base.url]",
                "is required for sitemap generation"
            ));
        }

        if self.build.search.enable {
            Self::check_command_installed("[build.search.command]", &self.build.search.command)?;
            if self.build.search.timeout == 0 {
                bail!(ConfigError::invalid(
                    "[build.search.timeout]",
                    "must be greater than zero"
                ));
            }
        }

        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(key: &'static str, command: &[String]) -> Result<()> {
        let Some(cmd) = command.first() else {
            bail!(ConfigError::invalid(key, "must have at least one element"));
        };

        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::BuildArgs;

    fn cli(command: Commands) -> Cli {
        Cli {
            root: None,
            output: None,
            content: None,
            config: PathBuf::from("devblog.toml"),
            command,
        }
    }

    fn build_cmd() -> Commands {
        Commands::Build {
            build_args: BuildArgs::default(),
        }
    }

    #[test]
    fn test_from_str() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = "My Blog"
            description = "A test blog"
            author = "Test Author"
        "#,
        )
        .unwrap();
        assert_eq!(config.base.title, "My Blog");
        assert_eq!(config.base.author, "Test Author");
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(SiteConfig::from_str("[base\ntitle = \"x\"").is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SiteConfig::from_path(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_get_root_default() {
        let config = SiteConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_set_root() {
        let mut config = SiteConfig::default();
        config.set_root(Path::new("/custom/path"));
        assert_eq!(config.get_root(), Path::new("/custom/path"));
    }

    #[test]
    fn test_update_with_cli_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = cli(build_cmd());
        args.root = Some(dir.path().to_path_buf());
        args.output = Some(PathBuf::from("site"));

        let mut config = SiteConfig::default();
        config.update_with_cli(&args);

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.get_root(), root);
        assert_eq!(config.build.output, root.join("site"));
        assert_eq!(config.build.content, root.join("src/content"));
        assert_eq!(config.config_path, root.join("devblog.toml"));
    }

    #[test]
    fn test_update_with_cli_build_overrides() {
        let args = cli(Commands::Build {
            build_args: BuildArgs {
                clean: true,
                minify: Some(true),
                sitemap: Some(false),
                search: Some(false),
                base_url: Some("https://preview.example.com".into()),
            },
        });

        let mut config = SiteConfig::default();
        config.update_with_cli(&args);

        assert!(config.build.clean);
        assert!(config.build.minify);
        assert!(!config.build.sitemap.enable);
        assert!(!config.build.search.enable);
        assert_eq!(config.base.url.as_deref(), Some("https://preview.example.com"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = SiteConfig::default();
        config.base.url = Some("ftp://example.com".into());
        assert!(config.validate(&Commands::Check).is_err());
    }

    #[test]
    fn test_validate_sitemap_requires_url() {
        let mut config = SiteConfig::default();
        config.build.search.enable = false;
        let err = config.validate(&build_cmd()).unwrap_err();
        assert!(err.to_string().contains("sitemap"));
        let key = err.downcast_ref::<ConfigError>().and_then(ConfigError::key);
        assert_eq!(key, Some("[base.url]"));

        config.base.url = Some("https://example.com".into());
        assert!(config.validate(&build_cmd()).is_ok());
    }

    #[test]
    fn test_validate_search_command_installed() {
        let mut config = SiteConfig::default();
        config.base.url = Some("https://example.com".into());
        config.build.search.command = vec!["devblog-missing-indexer-xyz".into()];
        assert!(config.validate(&build_cmd()).is_err());

        config.build.search.command = vec![];
        assert!(config.validate(&build_cmd()).is_err());
    }

    #[test]
    fn test_validate_check_skips_build_requirements() {
        let mut config = SiteConfig::default();
        config.build.search.command = vec!["devblog-missing-indexer-xyz".into()];
        assert!(config.validate(&Commands::Check).is_ok());
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let config = r#"
            [base]
            title = "Test"
            description = "Test"

            [serve]
            port = 8080
        "#;
        assert!(toml::from_str::<SiteConfig>(config).is_err());
    }
}
