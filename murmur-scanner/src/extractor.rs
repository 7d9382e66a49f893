use crate::record::{PDF_SENTINEL, UNSUPPORTED_SENTINEL};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;
use url::Url;

/// Buckets for embedded media discovered in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Youtube,
    Twitter,
    Vimeo,
    Instagram,
    OtherEmbedded,
}

pub type MediaMap = BTreeMap<MediaKind, Vec<String>>;

/// What the extractor pulls out of one fetched body.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub title: Option<String>,
    pub body_text: Option<String>,
    pub links: Vec<String>,
}

/// Parses a fetched body into title, body text and outbound links.
///
/// Sentinel bodies (PDF/unsupported markers) produce a descriptive
/// title/body and no links. Parse problems are logged and yield an empty
/// extraction rather than an error.
pub fn parse(body: &str, source_url: &str) -> Extraction {
    if let Some(url) = body.strip_prefix(PDF_SENTINEL) {
        return Extraction {
            title: Some(format!("PDF file: {}", url)),
            body_text: Some(format!(
                "This is a PDF file and cannot be rendered directly. Download link: {}",
                url
            )),
            links: Vec::new(),
        };
    }
    if let Some(content_type) = body.strip_prefix(UNSUPPORTED_SENTINEL) {
        return Extraction {
            title: Some(format!("Unsupported content: {}", source_url)),
            body_text: Some(format!(
                "This is a {} file and cannot be rendered directly. Download link: {}",
                content_type, source_url
            )),
            links: Vec::new(),
        };
    }

    let base = match Url::parse(source_url) {
        Ok(u) => u,
        Err(e) => {
            warn!("Cannot parse source URL {}: {}", source_url, e);
            return Extraction::default();
        }
    };

    let document = Html::parse_document(body);

    let title_selector = Selector::parse("title").unwrap();
    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "untitled".to_string());

    let content_selector = Selector::parse("p, h1, h2, h3, h4, h5, h6, article").unwrap();
    let body_text = document
        .select(&content_selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let link_selector = Selector::parse("a[href]").unwrap();
    let mut links = Vec::new();
    for element in document.select(&link_selector) {
        if let Some(href) = element.value().attr("href") {
            if href.starts_with('#') || href.starts_with("javascript:") {
                continue;
            }
            if let Ok(absolute) = base.join(href) {
                links.push(absolute.to_string());
            }
        }
    }

    Extraction {
        title: Some(title),
        body_text: Some(body_text),
        links,
    }
}

/// Scans markup for embedded media references: iframe video embeds plus
/// the standard Twitter/Instagram embed containers. Each bucket is
/// de-duplicated; empty buckets are omitted.
pub fn extract_embedded_media(html: &str, base_url: Option<&str>) -> MediaMap {
    let mut media = MediaMap::new();
    if html.is_empty() || crate::record::is_sentinel(html) {
        return media;
    }

    let document = Html::parse_document(html);
    let base = base_url.and_then(|b| Url::parse(b).ok());

    let iframe_selector = Selector::parse("iframe[src]").unwrap();
    for iframe in document.select(&iframe_selector) {
        let src = iframe.value().attr("src").unwrap_or("");
        if src.is_empty() {
            continue;
        }
        let src = if src.starts_with("http://") || src.starts_with("https://") {
            src.to_string()
        } else if let Some(ref b) = base {
            match b.join(src) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            }
        } else {
            src.to_string()
        };

        let kind = if src.contains("youtube.com/embed/") || src.contains("youtube-nocookie.com/embed/")
        {
            MediaKind::Youtube
        } else if src.contains("player.vimeo.com/video/") {
            MediaKind::Vimeo
        } else {
            MediaKind::OtherEmbedded
        };
        push_unique(&mut media, kind, src);
    }

    let twitter_selector = Selector::parse(
        "div.twitter-tweet a[href], div.twitter-timeline a[href], blockquote.twitter-tweet a[href]",
    )
    .unwrap();
    for anchor in document.select(&twitter_selector) {
        if let Some(href) = anchor.value().attr("href") {
            if href.contains("twitter.com") {
                push_unique(&mut media, MediaKind::Twitter, href.to_string());
            }
        }
    }

    let instagram_selector = Selector::parse("blockquote.instagram-media a[href]").unwrap();
    for anchor in document.select(&instagram_selector) {
        if let Some(href) = anchor.value().attr("href") {
            if href.contains("instagram.com/p/") {
                push_unique(&mut media, MediaKind::Instagram, href.to_string());
            }
        }
    }

    media
}

fn push_unique(media: &mut MediaMap, kind: MediaKind, url: String) {
    let bucket = media.entry(kind).or_default();
    if !bucket.contains(&url) {
        bucket.push(url);
    }
}
