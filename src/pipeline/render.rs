//! Page assembly.
//!
//! Turns loaded entries into [`Page`]s:
//!
//! | URL                  | Page                                    |
//! |----------------------|-----------------------------------------|
//! | `/<collection>/<id>/`| one entry, body wrapped for the indexer |
//! | `/<collection>/`     | listing, newest first                   |
//! | `/`                  | home: latest posts and projects         |
//!
//! The shared layout is applied when pages are written, after every
//! rendering stage has had a chance to add scripts.

use super::{BuildContext, Page};
use crate::{
    config::SiteConfig,
    content::{BLOG, Entry, ImageRef, PROJECTS},
    log,
};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use std::{
    borrow::Cow,
    cmp::Reverse,
    collections::HashSet,
    fmt::Write,
    fs,
    path::{Path, PathBuf},
};

/// Output directory for content-addressed hero images.
pub const ASSETS_DIR: &str = "_assets";

/// Entries per collection shown on the home page.
const HOME_LIMIT: usize = 3;

/// Assemble every page and register hero image copies.
pub fn run(ctx: &mut BuildContext) -> Result<()> {
    let mut pages = Vec::new();
    let mut copies = Vec::new();

    for (collection, entries) in ctx.content.iter() {
        for entry in entries {
            let hero = match entry.hero_image() {
                Some(image) => {
                    let (url, dest) = hero_asset(image)?;
                    copies.push((dest, image.path.clone()));
                    Some(url)
                }
                None => None,
            };
            pages.push(entry_page(ctx, entry, hero.as_deref()));
        }
        pages.push(listing_page(collection, &newest_first(entries)));
    }
    pages.push(home_page(ctx));
    check_unique_urls(&pages)?;

    log!("pages"; "assembled {} pages", pages.len());
    ctx.copies.extend(copies);
    ctx.pages.extend(pages);
    Ok(())
}

/// Two pages on one URL would race for the same output file.
fn check_unique_urls(pages: &[Page]) -> Result<()> {
    let mut seen = HashSet::with_capacity(pages.len());
    for page in pages {
        if !seen.insert(page.output_path()) {
            bail!("more than one page renders to `{}`", page.url);
        }
    }
    Ok(())
}

// ============================================================================
// Pages
// ============================================================================

pub fn entry_url(entry: &Entry) -> String {
    format!("/{}/{}/", entry.collection, entry.id)
}

fn entry_page(ctx: &BuildContext, entry: &Entry, hero: Option<&str>) -> Page {
    let mut body = String::with_capacity(entry.body.len() * 2);

    body.push_str("<article data-pagefind-body>\n");
    if let Some(src) = hero {
        let _ = writeln!(
            body,
            r#"<img class="hero" src="{}" alt="">"#,
            escape_html(src)
        );
    }
    let _ = writeln!(body, "<h1>{}</h1>", escape_html(entry.title()));
    if let Some(published) = entry.pub_date() {
        let _ = write!(body, r#"<p class="date">{}"#, time_tag(published));
        if let Some(updated) = entry.updated_date() {
            let _ = write!(body, " &middot; Updated {}", time_tag(updated));
        }
        body.push_str("</p>\n");
    }
    let _ = writeln!(
        body,
        "<div class=\"prose\">\n{}</div>",
        ctx.body(entry).unwrap_or_default()
    );
    if let Some(link) = entry.link() {
        let _ = writeln!(
            body,
            r#"<p class="project-link"><a href="{}">Visit project</a></p>"#,
            escape_html(link)
        );
    }
    body.push_str("</article>\n");

    let related = related_entries(ctx, entry);
    if !related.is_empty() {
        body.push_str("<aside class=\"related\">\n<h2>Related posts</h2>\n<ul>\n");
        for other in related {
            let _ = writeln!(
                body,
                r#"<li><a href="{}">{}</a></li>"#,
                entry_url(other),
                escape_html(other.title())
            );
        }
        body.push_str("</ul>\n</aside>\n");
    }

    Page {
        url: entry_url(entry),
        title: entry.title().to_owned(),
        description: entry.description().map(str::to_owned),
        lastmod: entry.last_modified(),
        body,
    }
}

fn listing_page(collection: &str, entries: &[&Entry]) -> Page {
    let title = heading(collection);
    let mut body = format!("<section class=\"listing\">\n<h1>{}</h1>\n", escape_html(&title));
    push_entry_list(&mut body, entries);
    body.push_str("</section>\n");

    Page {
        url: format!("/{collection}/"),
        title,
        description: None,
        lastmod: entries.iter().filter_map(|e| e.last_modified()).max(),
        body,
    }
}

fn home_page(ctx: &BuildContext) -> Page {
    let base = &ctx.config.base;
    let mut body = format!(
        "<section class=\"intro\">\n<h1>{}</h1>\n<p>{}</p>\n</section>\n",
        escape_html(&base.title),
        escape_html(&base.description)
    );

    for (collection, label) in [(BLOG, "Recent posts"), (PROJECTS, "Projects")] {
        let entries = newest_first(ctx.content.get(collection));
        if entries.is_empty() {
            continue;
        }
        let _ = writeln!(
            body,
            "<section class=\"recent\">\n<h2><a href=\"/{collection}/\">{label}</a></h2>"
        );
        push_entry_list(&mut body, &entries[..entries.len().min(HOME_LIMIT)]);
        body.push_str("</section>\n");
    }

    Page {
        url: "/".to_owned(),
        title: base.title.clone(),
        description: Some(base.description.clone()),
        lastmod: ctx.content.entries().filter_map(Entry::last_modified).max(),
        body,
    }
}

fn push_entry_list(body: &mut String, entries: &[&Entry]) {
    body.push_str("<ul class=\"entries\">\n");
    for entry in entries {
        let _ = write!(
            body,
            "<li>\n<a href=\"{}\"><h3>{}</h3></a>\n",
            entry_url(entry),
            escape_html(entry.title())
        );
        if let Some(description) = entry.description() {
            let _ = writeln!(body, "<p>{}</p>", escape_html(description));
        }
        if let Some(date) = entry.pub_date() {
            let _ = writeln!(body, "{}", time_tag(date));
        }
        body.push_str("</li>\n");
    }
    body.push_str("</ul>\n");
}

/// Publish date descending, then id, so equal dates list stably.
fn newest_first(entries: &[Entry]) -> Vec<&Entry> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        Reverse(a.pub_date())
            .cmp(&Reverse(b.pub_date()))
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted
}

/// Resolve `relatedPosts`; unknown ids are skipped with a warning.
fn related_entries<'c>(ctx: &'c BuildContext, entry: &Entry) -> Vec<&'c Entry> {
    entry
        .related()
        .iter()
        .filter_map(|id| {
            let found = ctx.content.find(&entry.collection, id);
            if found.is_none() {
                log!("warn"; "{}/{}: related post `{}` not found", entry.collection, entry.id, id);
            }
            found
        })
        .collect()
}

fn heading(collection: &str) -> String {
    let mut chars = collection.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn time_tag(date: DateTime<Utc>) -> String {
    format!(
        r#"<time datetime="{}">{}</time>"#,
        date.to_rfc3339(),
        date.format("%b %-d, %Y")
    )
}

// ============================================================================
// Hero Images
// ============================================================================

/// Content-addressed destination for a hero image.
///
/// Returns the site URL and the path relative to the output directory,
/// `_assets/<stem>.<hash>.<ext>` where `hash` is the first 8 hex digits of
/// the file's BLAKE3 digest.
pub fn hero_asset(image: &ImageRef) -> Result<(String, PathBuf)> {
    let bytes = fs::read(&image.path)
        .with_context(|| format!("Failed to read image {}", image.path.display()))?;
    let digest = blake3::hash(&bytes);
    let hash = hex::encode(&digest.as_bytes()[..4]);

    let stem = image
        .path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or(Cow::Borrowed("image"));
    let name = format!("{stem}.{hash}.{}", image.format.extension());

    let dest = Path::new(ASSETS_DIR).join(&name);
    Ok((format!("/{ASSETS_DIR}/{name}"), dest))
}

// ============================================================================
// Layout
// ============================================================================

/// Wrap a page in the site layout.
pub fn layout(config: &SiteConfig, scripts: &[String], page: &Page) -> String {
    let base = &config.base;
    let title = if page.url == "/" {
        escape_html(&base.title).into_owned()
    } else {
        format!("{} | {}", escape_html(&page.title), escape_html(&base.title))
    };
    let description = page.description.as_deref().unwrap_or(&base.description);

    let mut html = String::with_capacity(page.body.len() + 2048);
    let _ = writeln!(html, "<!DOCTYPE html>\n<html lang=\"{}\">", escape_html(&base.language));
    html.push_str("<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{title}</title>");
    let _ = writeln!(
        html,
        "<meta name=\"description\" content=\"{}\">",
        escape_html(description)
    );
    let _ = writeln!(html, "<meta name=\"author\" content=\"{}\">", escape_html(&base.author));
    if let Some(url) = base.url_trimmed() {
        let canonical = format!("{url}{}", page.url);
        let _ = writeln!(html, "<link rel=\"canonical\" href=\"{}\">", escape_html(&canonical));
        let _ = writeln!(html, "<meta property=\"og:url\" content=\"{}\">", escape_html(&canonical));
    }
    if config.build.sitemap.enable {
        html.push_str("<link rel=\"sitemap\" href=\"/sitemap-index.xml\">\n");
    }
    let _ = writeln!(html, "<meta property=\"og:title\" content=\"{title}\">");
    let _ = writeln!(
        html,
        "<meta property=\"og:description\" content=\"{}\">",
        escape_html(description)
    );
    if let Some(twitter) = &base.twitter {
        html.push_str("<meta name=\"twitter:card\" content=\"summary_large_image\">\n");
        let _ = writeln!(html, "<meta name=\"twitter:site\" content=\"{}\">", escape_html(twitter));
    }
    for script in scripts {
        let _ = writeln!(html, "<script type=\"module\" src=\"{}\"></script>", escape_html(script));
    }
    html.push_str("</head>\n<body>\n");

    let _ = writeln!(
        html,
        "<header>\n<nav>\n<a class=\"brand\" href=\"/\">{}</a>\n<a href=\"/{BLOG}/\">Blog</a>\n<a href=\"/{PROJECTS}/\">Projects</a>\n</nav>\n</header>",
        escape_html(&base.title)
    );
    let _ = write!(html, "<main>\n{}</main>\n", page.body);

    let _ = write!(html, "<footer>\n<p>&copy; {}</p>\n", escape_html(&base.author));
    if let Some(github) = &base.github {
        let _ = writeln!(
            html,
            "<a href=\"https://github.com/{0}\">GitHub @{0}</a>",
            escape_html(github)
        );
    }
    html.push_str("</footer>\n</body>\n</html>\n");
    html
}

/// Escape text for HTML content and attribute values.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BodyFormat, FieldValue, Fields, ImageFormat, SiteContent};
    use chrono::TimeZone;

    fn entry(collection: &str, id: &str, day: u32) -> Entry {
        let mut fields = Fields::new();
        fields.insert("title".into(), FieldValue::Text(format!("Title {id}")));
        fields.insert("description".into(), FieldValue::Text(format!("About {id}")));
        fields.insert(
            "pubDate".into(),
            FieldValue::Date(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()),
        );
        Entry {
            id: id.into(),
            collection: collection.into(),
            source: PathBuf::from(format!("{id}.md")),
            format: BodyFormat::Markdown,
            fields,
            body: String::new(),
        }
    }

    fn content(blog: Vec<Entry>, projects: Vec<Entry>) -> SiteContent {
        [(BLOG.to_owned(), blog), (PROJECTS.to_owned(), projects)]
            .into_iter()
            .collect()
    }

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.base.title = "DevBlog".into();
        config.base.description = "Notes & code".into();
        config.base.url = Some("https://blog.example.com/".into());
        config
    }

    fn page<'p>(ctx: &'p BuildContext, url: &str) -> &'p Page {
        ctx.pages.iter().find(|p| p.url == url).unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert!(matches!(escape_html("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_pages_for_every_entry_listing_and_home() {
        let config = config();
        let mut ctx = BuildContext::new(
            &config,
            content(vec![entry(BLOG, "a", 1), entry(BLOG, "b", 2)], vec![entry(PROJECTS, "p", 3)]),
        );
        run(&mut ctx).unwrap();

        let urls: Vec<_> = ctx.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, ["/blog/a/", "/blog/b/", "/blog/", "/projects/p/", "/projects/", "/"]);
    }

    #[test]
    fn test_entry_on_listing_url_is_rejected() {
        let config = config();
        let mut ctx = BuildContext::new(&config, content(vec![entry(BLOG, "", 1)], vec![]));

        let err = run(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("/blog/"));
        assert!(ctx.pages.is_empty());
    }

    #[test]
    fn test_entry_page_wraps_body_for_indexer() {
        let config = config();
        let post = entry(BLOG, "a", 1);
        let mut ctx = BuildContext::new(&config, content(vec![post.clone()], vec![]));
        ctx.bodies.insert(BuildContext::key(&post), "<p>Rendered</p>\n".into());
        run(&mut ctx).unwrap();

        let page = page(&ctx, "/blog/a/");
        assert!(page.body.starts_with("<article data-pagefind-body>"));
        assert!(page.body.contains("<p>Rendered</p>"));
        assert!(page.body.contains(r#"<time datetime="2024-01-01T00:00:00+00:00">Jan 1, 2024</time>"#));
        assert_eq!(page.description.as_deref(), Some("About a"));
    }

    #[test]
    fn test_listing_sorted_newest_first() {
        let config = config();
        let mut ctx = BuildContext::new(
            &config,
            content(
                vec![entry(BLOG, "old", 1), entry(BLOG, "new", 9), entry(BLOG, "also-old", 1)],
                vec![],
            ),
        );
        run(&mut ctx).unwrap();

        let listing = &page(&ctx, "/blog/").body;
        let new = listing.find("/blog/new/").unwrap();
        let also_old = listing.find("/blog/also-old/").unwrap();
        let old = listing.find("/blog/old/").unwrap();
        assert!(new < also_old && also_old < old);
    }

    #[test]
    fn test_related_posts_skip_unknown() {
        let config = config();
        let mut post = entry(BLOG, "a", 1);
        post.fields.insert(
            "relatedPosts".into(),
            FieldValue::TextList(vec!["b".into(), "ghost".into()]),
        );
        let mut ctx = BuildContext::new(&config, content(vec![post, entry(BLOG, "b", 2)], vec![]));
        run(&mut ctx).unwrap();

        let body = &page(&ctx, "/blog/a/").body;
        assert!(body.contains(r#"<li><a href="/blog/b/">Title b</a></li>"#));
        assert!(!body.contains("ghost"));
    }

    #[test]
    fn test_project_link() {
        let config = config();
        let mut project = entry(PROJECTS, "tool", 1);
        project
            .fields
            .insert("link".into(), FieldValue::Text("https://example.com/?a&b".into()));
        let mut ctx = BuildContext::new(&config, content(vec![], vec![project]));
        run(&mut ctx).unwrap();

        assert!(page(&ctx, "/projects/tool/").body.contains(r#"href="https://example.com/?a&amp;b""#));
    }

    #[test]
    fn test_hero_asset_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cover Art.png");
        fs::write(&path, b"fake png").unwrap();
        let image = ImageRef {
            src: "./Cover Art.png".into(),
            path,
            format: ImageFormat::Png,
        };

        let (url, dest) = hero_asset(&image).unwrap();
        let hash = blake3::hash(b"fake png").to_hex()[..8].to_owned();
        assert_eq!(url, format!("/_assets/Cover Art.{hash}.png"));
        assert_eq!(dest, Path::new("_assets").join(format!("Cover Art.{hash}.png")));
    }

    #[test]
    fn test_hero_image_registered_for_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.jpeg");
        fs::write(&path, b"jpeg").unwrap();

        let config = config();
        let mut post = entry(BLOG, "a", 1);
        post.fields.insert(
            "heroImage".into(),
            FieldValue::Image(ImageRef {
                src: "./hero.jpeg".into(),
                path: path.clone(),
                format: ImageFormat::Jpeg,
            }),
        );
        let mut ctx = BuildContext::new(&config, content(vec![post], vec![]));
        run(&mut ctx).unwrap();

        assert_eq!(ctx.copies.len(), 1);
        let (dest, source) = ctx.copies.iter().next().unwrap();
        assert_eq!(source, &path);
        assert!(dest.to_string_lossy().ends_with(".jpg"));
        assert!(page(&ctx, "/blog/a/").body.contains(r#"<img class="hero" src="/_assets/hero."#));
    }

    #[test]
    fn test_layout() {
        let mut config = config();
        config.base.twitter = Some("@dev".into());
        config.base.github = Some("dev".into());
        let page = Page {
            url: "/blog/a/".into(),
            title: "A <b>".into(),
            description: None,
            lastmod: None,
            body: "<p>x</p>\n".into(),
        };

        let html = layout(&config, &["/_islands/index.js".into()], &page);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A &lt;b&gt; | DevBlog</title>"));
        assert!(html.contains(r#"<meta name="description" content="Notes &amp; code">"#));
        assert!(html.contains(r#"<link rel="canonical" href="https://blog.example.com/blog/a/">"#));
        assert!(html.contains(r#"<link rel="sitemap" href="/sitemap-index.xml">"#));
        assert!(html.contains(r#"<script type="module" src="/_islands/index.js"></script>"#));
        assert!(html.contains(r#"<meta name="twitter:site" content="@dev">"#));
        assert!(html.contains("https://github.com/dev"));
        assert!(html.contains("<main>\n<p>x</p>\n</main>"));
    }

    #[test]
    fn test_layout_home_title() {
        let config = config();
        let page = Page {
            url: "/".into(),
            title: "ignored".into(),
            description: None,
            lastmod: None,
            body: String::new(),
        };
        assert!(layout(&config, &[], &page).contains("<title>DevBlog</title>"));
    }
}
