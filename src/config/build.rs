//! `[build]` section configuration.
//!
//! Contains build settings: paths, minification, and the ordered build
//! stages (markup plugins, sitemap, islands, search index).

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

// ============================================================================
// Enums
// ============================================================================

/// Content-transform plugin applied while rendering entry bodies.
///
/// Plugins run in the order they are listed in `[build.markup].plugins`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkupPlugin {
    /// Strip module `import`/`export` lines from `.mdx` bodies.
    Mdx,
    /// GitHub-flavored extensions: tables, strikethrough, task lists, footnotes.
    Gfm,
    /// Typographic quotes, dashes, and ellipses.
    Smartypants,
    /// Slug `id` attribute on every heading.
    HeadingIds,
    /// Open absolute links in a new tab.
    ExternalLinks,
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in devblog.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "src/content"  # Collections live in <content>/<name>/
/// output = "dist"          # Output directory
/// minify = true            # Minify HTML
///
/// [build.markup]
/// plugins = ["mdx", "gfm", "heading-ids"]
///
/// [build.search]
/// enable = true
/// command = ["npx", "pagefind", "--site"]
/// timeout = 300
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content directory; each collection reads `<content>/<collection>/`.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Static files copied verbatim into the output directory.
    #[serde(default = "defaults::build::public")]
    #[educe(Default = defaults::build::public())]
    pub public: PathBuf,

    /// Minify HTML and XML output.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Remove the output directory before writing.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Markup plugin chain.
    #[serde(default)]
    pub markup: MarkupConfig,

    /// Sitemap emission.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// UI-framework island assets.
    #[serde(default)]
    pub islands: IslandsConfig,

    /// Post-build search indexing.
    #[serde(default)]
    pub search: SearchConfig,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.markup]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct MarkupConfig {
    /// Ordered plugin list
    #[serde(default = "defaults::build::markup::plugins")]
    #[educe(Default = defaults::build::markup::plugins())]
    pub plugins: Vec<MarkupPlugin>,
}

/// `[build.sitemap]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    /// Emit `sitemap-index.xml` and `sitemap-0.xml`
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,
}

/// `[build.islands]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct IslandsConfig {
    /// Copy island scripts and hydrate them on every page
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Directory holding the island bundle (entry point `index.js`)
    #[serde(default = "defaults::build::islands::dir")]
    #[educe(Default = defaults::build::islands::dir())]
    pub dir: PathBuf,
}

/// `[build.search]` section
///
/// The output directory is appended as the last argument of `command`.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Run the indexer after the output is written
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Indexer command and leading arguments
    #[serde(default = "defaults::build::search::command")]
    #[educe(Default = defaults::build::search::command())]
    pub command: Vec<String>,

    /// Seconds to wait before the indexer is killed
    #[serde(default = "defaults::build::search::timeout")]
    #[educe(Default = defaults::build::search::timeout())]
    pub timeout: u64,
}

impl SearchConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

// ============================================================================
// Tests
// ============================================================================
