use murmur_scanner::extractor::{extract_embedded_media, MediaKind, MediaMap};
use murmur_scanner::record::{is_sentinel, PDF_SENTINEL, UNSUPPORTED_SENTINEL};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Tags removed wholesale. `iframe` is deliberately kept so video embeds
/// survive cleaning and show up in the media references.
const NOISE_TAGS: [&str; 9] = [
    "script", "style", "nav", "footer", "header", "aside", "noscript", "meta", "svg",
];

/// Class/id substrings that mark ad, navigation and chrome containers.
const DENYLIST: [&str; 10] = [
    "ad", "ads", "advertisement", "banner", "social", "sidebar", "footer", "header", "nav", "menu",
];

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn media_label(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Youtube => "Embedded YouTube videos",
        MediaKind::Twitter => "Embedded Twitter content",
        MediaKind::Vimeo => "Embedded Vimeo videos",
        MediaKind::Instagram => "Embedded Instagram content",
        MediaKind::OtherEmbedded => "Other embedded content",
    }
}

/// Strips boilerplate from markup and rewrites relative URLs.
///
/// Sentinel content passes through untouched. Noise tags and denylisted
/// class/id containers are dropped, `src`/`href` attributes become
/// absolute, and the result is the first main-content subtree found
/// (`<main>`, `<article>`, a content-ish `<div>`, `<body>`, or the whole
/// document). Discovered embeds are appended as a reference block.
pub fn clean_markup(html: &str, base_url: Option<&str>) -> String {
    if html.is_empty() || is_sentinel(html) {
        return html.to_string();
    }

    let media = extract_embedded_media(html, base_url);
    let document = Html::parse_document(html);
    let base = base_url.and_then(|b| Url::parse(b).ok());

    let root = select_main_content(&document);
    let mut out = String::new();
    match root {
        Some(element) => emit_element(element, &base, &mut out),
        None => {
            for child in document.tree.root().children() {
                if let Some(element) = ElementRef::wrap(child) {
                    emit_element(element, &base, &mut out);
                }
            }
        }
    }

    if !media.is_empty() {
        out.push_str(&render_media_block(&media));
    }
    out
}

/// Converts cleaned markup to structured plain text: `#`-prefixed
/// headings, paragraphs, bulleted and numbered lists, then a media
/// summary. Sentinels become a human-readable description instead.
pub fn extract_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    if let Some(url) = html.strip_prefix(PDF_SENTINEL) {
        return format!(
            "This is a PDF file and cannot be rendered directly. Download link: {}",
            url
        );
    }
    if let Some(content_type) = html.strip_prefix(UNSUPPORTED_SENTINEL) {
        return format!(
            "This is a {} file and cannot be rendered directly.",
            content_type
        );
    }

    let document = Html::parse_document(html);
    let mut parts: Vec<String> = Vec::new();

    for level in 1..=6 {
        let selector = Selector::parse(&format!("h{}", level)).unwrap();
        for heading in document.select(&selector) {
            let text = element_text(heading);
            if !text.is_empty() {
                parts.push(format!("{} {}\n", "#".repeat(level), text));
            }
        }
    }

    let p_selector = Selector::parse("p").unwrap();
    for paragraph in document.select(&p_selector) {
        let text = element_text(paragraph);
        if !text.is_empty() {
            parts.push(format!("{}\n", text));
        }
    }

    let ul_selector = Selector::parse("ul > li").unwrap();
    for item in document.select(&ul_selector) {
        let text = element_text(item);
        if !text.is_empty() {
            parts.push(format!("- {}\n", text));
        }
    }

    let ol_selector = Selector::parse("ol").unwrap();
    let li_selector = Selector::parse("li").unwrap();
    for list in document.select(&ol_selector) {
        for (i, item) in list.select(&li_selector).enumerate() {
            let text = element_text(item);
            if !text.is_empty() {
                parts.push(format!("{}. {}\n", i + 1, text));
            }
        }
    }

    if parts.is_empty() {
        let text = document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        parts.push(text);
    }

    let mut out = parts.join("\n");

    let media = extract_embedded_media(html, None);
    if !media.is_empty() {
        out.push_str("\n\nEmbedded media:\n");
        for (kind, urls) in &media {
            out.push_str(&format!("\n{}:\n", media_label(*kind)));
            for url in urls {
                out.push_str(&format!("- {}\n", url));
            }
        }
    }
    out
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_denylisted(element: &ElementRef) -> bool {
    let value = element.value();
    for attr in ["class", "id"] {
        if let Some(v) = value.attr(attr) {
            let v = v.to_lowercase();
            if DENYLIST.iter().any(|needle| v.contains(needle)) {
                return true;
            }
        }
    }
    false
}

fn select_main_content(document: &Html) -> Option<ElementRef<'_>> {
    let main_selector = Selector::parse("main").unwrap();
    if let Some(main) = document.select(&main_selector).next() {
        return Some(main);
    }
    let article_selector = Selector::parse("article").unwrap();
    if let Some(article) = document.select(&article_selector).next() {
        return Some(article);
    }

    let div_selector = Selector::parse("div[class]").unwrap();
    for div in document.select(&div_selector) {
        if is_denylisted(&div) {
            continue;
        }
        let class = div.value().attr("class").unwrap_or("").to_lowercase();
        if ["content", "article", "post", "body"]
            .iter()
            .any(|needle| class.contains(needle))
        {
            return Some(div);
        }
    }

    let body_selector = Selector::parse("body").unwrap();
    document.select(&body_selector).next()
}

/// Serializes one element, dropping noise and rewriting URLs on the way.
fn emit_element(element: ElementRef, base: &Option<Url>, out: &mut String) {
    let name = element.value().name();
    if NOISE_TAGS.contains(&name) || is_denylisted(&element) {
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr_name, attr_value) in element.value().attrs() {
        let rewritten;
        let value = if matches!(attr_name, "src" | "href") {
            match base {
                Some(base) => {
                    rewritten = base
                        .join(attr_value)
                        .map(|u| u.to_string())
                        .unwrap_or_else(|_| attr_value.to_string());
                    rewritten.as_str()
                }
                None => attr_value,
            }
        } else {
            attr_value
        };
        out.push(' ');
        out.push_str(attr_name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }

    if VOID_ELEMENTS.contains(&name) {
        out.push_str(">");
        return;
    }
    out.push('>');

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    emit_element(child_element, base, out);
                }
            }
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn render_media_block(media: &MediaMap) -> String {
    let mut block = String::from("<div class=\"embedded-media-references\">\n");
    for (kind, urls) in media {
        block.push_str(&format!("<h3>{}:</h3>\n<ul>\n", media_label(*kind)));
        for url in urls {
            block.push_str(&format!(
                "<li><a href=\"{}\" target=\"_blank\">{}</a></li>\n",
                escape_attr(url),
                escape_text(url)
            ));
        }
        block.push_str("</ul>\n");
    }
    block.push_str("</div>");
    block
}
