//! `[base]` section configuration.
//!
//! Contains basic site information like title, author, description, etc.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in devblog.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "DevBlog"
/// description = "A developer blog"
/// author = "Alice"
/// url = "https://blog.example.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title displayed in browser tab and headers.
    pub title: String,

    /// Site description for SEO meta tags and the home page.
    pub description: String,

    /// Canonical site URL, used for canonical links and the sitemap.
    /// Required when `[build.sitemap].enable = true`.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// Author name for meta tags.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    /// BCP 47 language code (e.g., "en", "zh-Hans").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,

    /// Twitter handle for card meta tags, e.g.: "@alice"
    #[serde(default)]
    pub twitter: Option<String>,

    /// GitHub username linked from the footer.
    #[serde(default)]
    pub github: Option<String>,
}

impl BaseConfig {
    /// Site URL without a trailing slash.
    pub fn url_trimmed(&self) -> Option<&str> {
        self.url.as_deref().map(|url| url.trim_end_matches('/'))
    }
}
