// SPDX-License-Identifier: MPL-2.0

//! Open Graph metadata scraped from a fetched page.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static OG_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+(?:property|name)="og:title"\s+content="([^"]*)""#).unwrap()
});

static OG_DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+(?:property|name)="og:description"\s+content="([^"]*)""#).unwrap()
});

static OG_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+(?:property|name)="og:image"\s+content="([^"]*)""#).unwrap()
});

// Reversed attribute order (content before property)
static OG_TITLE_RE2: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+content="([^"]*)"\s+(?:property|name)="og:title""#).unwrap()
});

static OG_DESC_RE2: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+content="([^"]*)"\s+(?:property|name)="og:description""#).unwrap()
});

static OG_IMAGE_RE2: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+content="([^"]*)"\s+(?:property|name)="og:image""#).unwrap()
});

static HTML_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title[^>]*>([^<]*)</title>").unwrap());

/// Link card metadata for an external page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMeta {
    /// The page's URL after redirects
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Absolute URL of the preview image
    pub image: Option<String>,
}

impl LinkMeta {
    pub fn from_html(final_url: &str, html: &str) -> Self {
        let title = og_value(html, &OG_TITLE_RE, &OG_TITLE_RE2).or_else(|| {
            HTML_TITLE_RE
                .captures(html)
                .and_then(|c| c.get(1))
                .map(|m| html_decode(m.as_str().trim()))
                .filter(|s| !s.is_empty())
        });
        let description = og_value(html, &OG_DESC_RE, &OG_DESC_RE2);
        let image = og_value(html, &OG_IMAGE_RE, &OG_IMAGE_RE2)
            .and_then(|src| absolute_url(final_url, &src));

        Self {
            url: final_url.to_string(),
            title,
            description,
            image,
        }
    }
}

/// First match of either attribute ordering, decoded and non-empty.
fn og_value(html: &str, primary: &Regex, reversed: &Regex) -> Option<String> {
    primary
        .captures(html)
        .or_else(|| reversed.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| html_decode(m.as_str().trim()))
        .filter(|s| !s.is_empty())
}

/// Resolve a possibly relative image reference against the page URL.
fn absolute_url(base: &str, src: &str) -> Option<String> {
    match Url::parse(src) {
        Ok(url) => Some(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)
            .and_then(|base| base.join(src))
            .ok()
            .map(|url| url.to_string()),
        Err(_) => None,
    }
}

/// Basic HTML entity decoding for OG metadata values.
fn html_decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
