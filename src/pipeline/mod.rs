//! Build pipeline.
//!
//! A build walks a fixed lifecycle and never retries a stage:
//!
//! ```text
//! Idle ──► Scanning ──► Rendering ──► Writing ──► Indexing ──► Done
//!             │             │            │            │
//!             └─────────────┴────────────┴────────────┴──► Failed(error)
//! ```
//!
//! - **Scanning**: every collection is loaded and validated
//! - **Rendering**: rendering-phase stages run in declaration order and
//!   fill the [`BuildContext`] with pages, copies, and generated files
//! - **Writing**: the output directory is materialized
//! - **Indexing**: the search-index hook runs against the written output
//!
//! A failure leaves whatever was already written on disk.

pub mod islands;
pub mod markup;
mod output;
pub mod render;
pub mod search;
pub mod sitemap;

pub use islands::IslandsStage;
pub use markup::MarkupStage;
pub use search::{HookError, SearchIndexHook};

use crate::{
    config::SiteConfig,
    content::{Entry, ImageResolver, Registry, SiteContent},
    log,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

// ============================================================================
// Lifecycle
// ============================================================================

/// Where a build currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Scanning,
    Rendering,
    Writing,
    Indexing,
    Done,
    /// Terminal; carries the rendered error chain.
    Failed(String),
}

impl BuildState {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Scanning => f.write_str("scanning"),
            Self::Rendering => f.write_str("rendering"),
            Self::Writing => f.write_str("writing"),
            Self::Indexing => f.write_str("indexing"),
            Self::Done => f.write_str("done"),
            Self::Failed(_) => f.write_str("failed"),
        }
    }
}

/// Lifecycle phase a stage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Rendering,
    Indexing,
}

// ============================================================================
// Build Context
// ============================================================================

/// One HTML page of the site, before layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Site-relative URL with leading and trailing slash, e.g. `/blog/hello/`.
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub lastmod: Option<DateTime<Utc>>,
    /// Inner HTML placed in the layout's `<main>`.
    pub body: String,
}

impl Page {
    /// Output file relative to the output directory.
    pub fn output_path(&self) -> PathBuf {
        Path::new(self.url.trim_matches('/')).join("index.html")
    }
}

/// State shared by the stages of one build.
#[derive(Debug)]
pub struct BuildContext<'a> {
    pub config: &'a SiteConfig,
    pub content: SiteContent,
    /// Rendered entry bodies, keyed by `(collection, id)`.
    pub bodies: BTreeMap<(String, String), String>,
    pub pages: Vec<Page>,
    /// Module scripts every page loads.
    pub scripts: Vec<String>,
    /// Files to copy, keyed by destination relative to the output directory.
    pub copies: BTreeMap<PathBuf, PathBuf>,
    /// Generated files, keyed by destination relative to the output directory.
    pub files: BTreeMap<PathBuf, Vec<u8>>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a SiteConfig, content: SiteContent) -> Self {
        Self {
            config,
            content,
            bodies: BTreeMap::new(),
            pages: Vec::new(),
            scripts: Vec::new(),
            copies: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    pub fn key(entry: &Entry) -> (String, String) {
        (entry.collection.clone(), entry.id.clone())
    }

    /// Rendered body of `entry`, if the markup stage has run.
    pub fn body(&self, entry: &Entry) -> Option<&str> {
        self.bodies.get(&Self::key(entry)).map(String::as_str)
    }
}

// ============================================================================
// Stages
// ============================================================================

/// A registered build stage.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Render entry bodies with the markup plugin chain.
    Markup(MarkupStage),
    /// Assemble entry, listing, and home pages.
    Pages,
    /// Emit `sitemap-index.xml` and `sitemap-0.xml`.
    Sitemap,
    /// Ship UI-framework island scripts.
    Islands(IslandsStage),
    /// Run the external search indexer over the output.
    SearchIndex(SearchIndexHook),
}

impl Stage {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Markup(_) => "markup",
            Self::Pages => "pages",
            Self::Sitemap => "sitemap",
            Self::Islands(_) => "islands",
            Self::SearchIndex(_) => "search",
        }
    }

    pub const fn phase(&self) -> Phase {
        match self {
            Self::SearchIndex(_) => Phase::Indexing,
            _ => Phase::Rendering,
        }
    }

    pub fn run(&self, ctx: &mut BuildContext) -> Result<()> {
        match self {
            Self::Markup(stage) => stage.run(ctx),
            Self::Pages => render::run(ctx),
            Self::Sitemap => sitemap::run(ctx),
            Self::Islands(stage) => stage.run(ctx),
            Self::SearchIndex(hook) => hook.run(ctx),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Counts reported by a finished build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub entries: usize,
    pub pages: usize,
    pub files: usize,
}

/// Ordered stages plus the lifecycle of the current build.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    state: BuildState,
    history: Vec<BuildState>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            state: BuildState::Idle,
            history: vec![BuildState::Idle],
        }
    }

    /// Stages enabled by the configuration, in declaration order.
    pub fn from_config(config: &SiteConfig) -> Self {
        let build = &config.build;
        let mut stages = vec![
            Stage::Markup(MarkupStage::new(&build.markup.plugins)),
            Stage::Pages,
        ];
        if build.sitemap.enable {
            stages.push(Stage::Sitemap);
        }
        if build.islands.enable {
            stages.push(Stage::Islands(IslandsStage::new(&build.islands.dir)));
        }
        if build.search.enable {
            stages.push(Stage::SearchIndex(SearchIndexHook::from_config(
                &build.search,
            )));
        }
        Self::new(stages)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn state(&self) -> &BuildState {
        &self.state
    }

    /// Every state this pipeline has entered, in order.
    pub fn history(&self) -> &[BuildState] {
        &self.history
    }

    /// Run one build to `Done` or `Failed`.
    ///
    /// # Errors
    /// The first stage error, unchanged; the state is then `Failed`.
    pub fn run(&mut self, config: &SiteConfig, registry: &Registry) -> Result<BuildReport> {
        match self.execute(config, registry) {
            Ok(report) => {
                self.transition(BuildState::Done);
                log!("build"; "done: {} entries, {} pages, {} files", report.entries, report.pages, report.files);
                Ok(report)
            }
            Err(err) => {
                self.transition(BuildState::Failed(format!("{err:#}")));
                Err(err)
            }
        }
    }

    fn execute(&mut self, config: &SiteConfig, registry: &Registry) -> Result<BuildReport> {
        self.transition(BuildState::Scanning);
        let content = scan(config, registry)?;
        let entries = content.total();

        self.transition(BuildState::Rendering);
        let mut ctx = BuildContext::new(config, content);
        run_phase(&self.stages, Phase::Rendering, &mut ctx)?;

        self.transition(BuildState::Writing);
        let files = output::write(&ctx)?;

        if self.stages.iter().any(|s| s.phase() == Phase::Indexing) {
            self.transition(BuildState::Indexing);
            run_phase(&self.stages, Phase::Indexing, &mut ctx)?;
        }

        Ok(BuildReport {
            entries,
            pages: ctx.pages.len(),
            files,
        })
    }

    fn transition(&mut self, next: BuildState) {
        log!("build"; "{} -> {}", self.state, next);
        self.state = next.clone();
        self.history.push(next);
    }
}

/// Load and validate every collection of `registry`.
pub fn scan(config: &SiteConfig, registry: &Registry) -> Result<SiteContent> {
    let images = ImageResolver::new(&config.build.public);
    Ok(registry.load_all(&images)?)
}

fn run_phase(stages: &[Stage], phase: Phase, ctx: &mut BuildContext) -> Result<()> {
    for stage in stages.iter().filter(|s| s.phase() == phase) {
        log!("build"; "stage {}", stage.name());
        stage.run(ctx)?;
    }
    Ok(())
}
