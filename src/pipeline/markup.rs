//! Markdown and MDX rendering.
//!
//! Plugins run in the order they are configured. Each one works on the
//! output of the previous: `mdx` rewrites the source text, `gfm` and
//! `smartypants` switch parser extensions on, and `heading-ids` and
//! `external-links` rewrite the event stream before it is turned into HTML.

use super::{BuildContext, render::escape_html};
use crate::{
    config::MarkupPlugin,
    content::{BodyFormat, Entry},
    log,
    utils::slug::slugify,
};
use anyhow::Result;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use rayon::prelude::*;
use std::{borrow::Cow, collections::HashMap};

/// Renders entry bodies with an ordered plugin chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupStage {
    plugins: Vec<MarkupPlugin>,
}

impl MarkupStage {
    pub fn new(plugins: &[MarkupPlugin]) -> Self {
        Self {
            plugins: plugins.to_vec(),
        }
    }

    pub fn plugins(&self) -> &[MarkupPlugin] {
        &self.plugins
    }

    /// Render every loaded entry into `ctx.bodies`.
    pub fn run(&self, ctx: &mut BuildContext) -> Result<()> {
        let rendered: Vec<_> = ctx
            .content
            .entries()
            .collect::<Vec<_>>()
            .par_iter()
            .map(|entry| (BuildContext::key(entry), self.render_entry(entry)))
            .collect();

        log!("markup"; "rendered {} bodies", rendered.len());
        ctx.bodies.extend(rendered);
        Ok(())
    }

    fn render_entry(&self, entry: &Entry) -> String {
        self.render(&entry.body, entry.format)
    }

    /// Render one body to HTML.
    pub fn render(&self, body: &str, format: BodyFormat) -> String {
        let mut source = Cow::Borrowed(body);
        let mut options = Options::empty();

        for plugin in &self.plugins {
            match plugin {
                MarkupPlugin::Mdx if format == BodyFormat::Mdx => {
                    source = Cow::Owned(strip_esm(&source));
                }
                MarkupPlugin::Gfm => {
                    options.insert(Options::ENABLE_TABLES);
                    options.insert(Options::ENABLE_STRIKETHROUGH);
                    options.insert(Options::ENABLE_TASKLISTS);
                    options.insert(Options::ENABLE_FOOTNOTES);
                }
                MarkupPlugin::Smartypants => options.insert(Options::ENABLE_SMART_PUNCTUATION),
                _ => {}
            }
        }

        let mut events: Vec<Event> = Parser::new_ext(&source, options).collect();
        for plugin in &self.plugins {
            match plugin {
                MarkupPlugin::HeadingIds => add_heading_ids(&mut events),
                MarkupPlugin::ExternalLinks => events = mark_external_links(events),
                _ => {}
            }
        }

        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }
}

// ============================================================================
// MDX
// ============================================================================

/// Drop top-level ESM `import`/`export` statements.
///
/// Fenced code blocks are left alone. A statement with an unclosed `{`
/// continues until the line that closes it.
fn strip_esm(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut fence: Option<&str> = None;
    let mut open_braces = 0usize;

    for line in source.split_inclusive('\n') {
        let trimmed = line.trim_start();

        if open_braces > 0 {
            open_braces = update_depth(open_braces, line);
            continue;
        }

        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
            out.push_str(line);
            continue;
        }

        if let Some(marker) = ["```", "~~~"].into_iter().find(|m| trimmed.starts_with(m)) {
            fence = Some(marker);
            out.push_str(line);
            continue;
        }

        if line.starts_with("import ") || line.starts_with("export ") {
            open_braces = update_depth(0, line);
            continue;
        }

        out.push_str(line);
    }
    out
}

fn update_depth(depth: usize, line: &str) -> usize {
    line.chars().fold(depth, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth.saturating_sub(1),
        _ => depth,
    })
}

// ============================================================================
// Event Rewriting
// ============================================================================

/// Give every heading without an explicit id a unique slug id.
fn add_heading_ids(events: &mut [Event]) {
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut i = 0;

    while i < events.len() {
        let Event::Start(Tag::Heading { id: None, .. }) = &events[i] else {
            i += 1;
            continue;
        };

        let mut text = String::new();
        let mut j = i + 1;
        while j < events.len() {
            match &events[j] {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
            j += 1;
        }

        let base = match slugify(&text) {
            slug if slug.is_empty() => "section".to_owned(),
            slug => slug,
        };
        let count = used.entry(base.clone()).or_insert(0);
        let slug = match *count {
            0 => base,
            n => format!("{base}-{n}"),
        };
        *count += 1;

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug));
        }
        i = j;
    }
}

/// Open absolute `http(s)` links in a new tab.
fn mark_external_links(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut stack = Vec::new();

    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Link {
                ref dest_url,
                ref title,
                ..
            }) => {
                let external = is_external(dest_url);
                stack.push(external);
                if !external {
                    return event;
                }
                let title = match title.is_empty() {
                    true => String::new(),
                    false => format!(r#" title="{}""#, escape_html(title)),
                };
                Event::Html(CowStr::from(format!(
                    r#"<a href="{}"{title} target="_blank" rel="noopener noreferrer">"#,
                    escape_html(dest_url)
                )))
            }
            Event::End(TagEnd::Link) => match stack.pop() {
                Some(true) => Event::Html(CowStr::Borrowed("</a>")),
                _ => event,
            },
            other => other,
        })
        .collect()
}

fn is_external(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://") || url.starts_with("//")
}
