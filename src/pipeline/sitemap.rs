//! Sitemap generation.
//!
//! Lists every page for search engine indexing, split the way crawlers
//! expect from larger sites: an index pointing at numbered sitemap files.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/blog/hello/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use super::{BuildContext, Page};
use crate::{
    log,
    utils::minify::{MinifyType, minify},
};
use anyhow::{Context, Result};
use std::path::PathBuf;

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Maximum URLs per sitemap file
const MAX_URLS: usize = 45_000;

pub const INDEX_FILE: &str = "sitemap-index.xml";

// ============================================================================
// Public API
// ============================================================================

/// Register `sitemap-index.xml` and `sitemap-<n>.xml` as generated files.
pub fn run(ctx: &mut BuildContext) -> Result<()> {
    let config = ctx.config;
    let base_url = config
        .base
        .url_trimmed()
        .context("[base.url] is required for sitemap generation")?;

    let sitemap = Sitemap::from_pages(base_url, &ctx.pages);
    let files = sitemap.into_files(base_url);

    for (name, xml) in files {
        let xml = minify(MinifyType::Xml(xml.as_bytes()), config).into_owned();
        log!("sitemap"; "{}", name.display());
        ctx.files.insert(name, xml);
    }
    Ok(())
}

// ============================================================================
// Sitemap Implementation
// ============================================================================

/// Sitemap data structure
struct Sitemap {
    /// List of URL entries
    urls: Vec<UrlEntry>,
}

/// Single URL entry in the sitemap
struct UrlEntry {
    /// Full URL location
    loc: String,
    /// Last modification date (optional, YYYY-MM-DD format)
    lastmod: Option<String>,
}

impl Sitemap {
    /// Build sitemap from assembled pages, sorted by URL.
    fn from_pages(base_url: &str, pages: &[Page]) -> Self {
        let mut urls: Vec<UrlEntry> = pages
            .iter()
            .map(|page| UrlEntry {
                loc: format!("{base_url}{}", page.url),
                lastmod: page.lastmod.map(|d| d.format("%Y-%m-%d").to_string()),
            })
            .collect();
        urls.sort_by(|a, b| a.loc.cmp(&b.loc));

        Self { urls }
    }

    /// Split into numbered `urlset` files plus the index that lists them.
    fn into_files(self, base_url: &str) -> Vec<(PathBuf, String)> {
        let chunks: Vec<&[UrlEntry]> = match self.urls.is_empty() {
            true => vec![&self.urls[..]],
            false => self.urls.chunks(MAX_URLS).collect(),
        };

        let mut files = Vec::with_capacity(chunks.len() + 1);
        let mut index = String::with_capacity(256);
        index.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        index.push('\n');
        index.push_str(&format!(r#"<sitemapindex xmlns="{SITEMAP_NS}">"#));
        index.push('\n');

        for (n, chunk) in chunks.into_iter().enumerate() {
            let name = format!("sitemap-{n}.xml");
            index.push_str("  <sitemap>\n");
            index.push_str(&format!(
                "    <loc>{}</loc>\n",
                escape_xml(&format!("{base_url}/{name}"))
            ));
            index.push_str("  </sitemap>\n");
            files.push((PathBuf::from(name), urlset_xml(chunk)));
        }

        index.push_str("</sitemapindex>\n");
        files.push((PathBuf::from(INDEX_FILE), index));
        files
    }
}

/// Generate one `urlset` document.
fn urlset_xml(urls: &[UrlEntry]) -> String {
    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SiteConfig, content::SiteContent};
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    fn make_page(url: &str, lastmod: Option<(i32, u32, u32)>) -> Page {
        Page {
            url: url.to_string(),
            title: String::new(),
            description: None,
            lastmod: lastmod.map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()),
            body: String::new(),
        }
    }

    fn config(url: Option<&str>) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.base.url = url.map(str::to_owned);
        config
    }

    fn file<'a>(ctx: &'a BuildContext, name: &str) -> &'a str {
        std::str::from_utf8(&ctx.files[Path::new(name)]).unwrap()
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("hello"), "hello");
        assert_eq!(escape_xml("<test>"), "&lt;test&gt;");
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml(r#"say "hi""#), "say &quot;hi&quot;");
        assert_eq!(escape_xml("it's"), "it&apos;s");
    }

    #[test]
    fn test_urlset_empty() {
        let xml = urlset_xml(&[]);
        assert!(xml.contains(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#)));
        assert!(xml.contains("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_sitemap_pages_sorted_with_lastmod() {
        let pages = [
            make_page("/blog/hello/", Some((2025, 1, 1))),
            make_page("/", None),
        ];
        let sitemap = Sitemap::from_pages("https://example.com", &pages);
        let xml = urlset_xml(&sitemap.urls);

        let home = xml.find("<loc>https://example.com/</loc>").unwrap();
        let post = xml.find("<loc>https://example.com/blog/hello/</loc>").unwrap();
        assert!(home < post);
        assert!(xml.contains("<lastmod>2025-01-01</lastmod>"));
        assert_eq!(xml.matches("<lastmod>").count(), 1);
    }

    #[test]
    fn test_run_writes_index_and_urlset() {
        let config = config(Some("https://example.com/"));
        let mut ctx = BuildContext::new(&config, SiteContent::default());
        ctx.pages.push(make_page("/", None));
        run(&mut ctx).unwrap();

        let index = file(&ctx, INDEX_FILE);
        assert!(index.contains("<sitemapindex"));
        assert!(index.contains("<loc>https://example.com/sitemap-0.xml</loc>"));
        assert!(file(&ctx, "sitemap-0.xml").contains("<loc>https://example.com/</loc>"));
    }

    #[test]
    fn test_run_minifies_when_enabled() {
        let mut config = config(Some("https://example.com"));
        config.build.minify = true;
        let mut ctx = BuildContext::new(&config, SiteContent::default());
        run(&mut ctx).unwrap();

        assert!(!file(&ctx, "sitemap-0.xml").contains('\n'));
    }

    #[test]
    fn test_run_requires_base_url() {
        let config = config(None);
        let mut ctx = BuildContext::new(&config, SiteContent::default());
        assert!(run(&mut ctx).is_err());
    }
}
