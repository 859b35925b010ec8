//! Minification utilities for HTML and XML.
//!
//! Provides a unified `minify` function that handles both HTML and XML,
//! with automatic enable/disable based on `SiteConfig`.

use crate::config::SiteConfig;
use std::borrow::Cow;

/// Content type for minification.
pub enum MinifyType<'a> {
    /// HTML content
    Html(&'a [u8]),
    /// XML content
    Xml(&'a [u8]),
}

/// Minify content based on type and config.
///
/// Returns `Cow::Borrowed` if minify disabled, `Cow::Owned` if minified.
pub fn minify<'a>(content: MinifyType<'a>, config: &SiteConfig) -> Cow<'a, [u8]> {
    match (config.build.minify, content) {
        (false, MinifyType::Html(bytes) | MinifyType::Xml(bytes)) => Cow::Borrowed(bytes),
        (true, MinifyType::Html(html)) => Cow::Owned(minify_html_inner(html)),
        (true, MinifyType::Xml(xml)) => Cow::Owned(minify_xml_inner(xml)),
    }
}

/// Minify HTML content using `minify_html` crate.
fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}

/// Minify XML by removing indentation and blank lines.
///
/// Works on raw bytes; only ASCII whitespace around lines is touched.
fn minify_xml_inner(xml: &[u8]) -> Vec<u8> {
    xml.split(|&b| b == b'\n')
        .map(<[u8]>::trim_ascii)
        .filter(|line| !line.is_empty())
        .flatten()
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_minify(enabled: bool) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.minify = enabled;
        config
    }

    #[test]
    fn test_minify_disabled_borrows() {
        let config = config_with_minify(false);
        let html = b"<p>  hello  </p>\n";
        let result = minify(MinifyType::Html(html), &config);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(&*result, html);
    }

    #[test]
    fn test_minify_html_enabled() {
        let config = config_with_minify(true);
        let html = b"<html>\n  <body>\n    <p>hello</p>\n  </body>\n</html>\n";
        let result = minify(MinifyType::Html(html), &config);
        assert!(result.len() < html.len());
    }

    #[test]
    fn test_minify_xml_enabled() {
        let config = config_with_minify(true);
        let xml = b"<urlset>\n  <url>\n    <loc>https://a.b/</loc>\n  </url>\n</urlset>\n";
        let result = minify(MinifyType::Xml(xml), &config);
        assert_eq!(&*result, b"<urlset><url><loc>https://a.b/</loc></url></urlset>");
    }

    #[test]
    fn test_minify_xml_keeps_non_utf8_bytes() {
        let config = config_with_minify(true);
        let xml = b"<loc>\xff</loc>\r\n  <loc>caf\xc3\xa9</loc>\n";
        let result = minify(MinifyType::Xml(xml), &config);
        assert_eq!(&*result, b"<loc>\xff</loc><loc>caf\xc3\xa9</loc>");
    }
}
