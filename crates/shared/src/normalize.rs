//! Raw article markup to canonical Markdown, plus the content fingerprint.
//!
//! The fingerprint is computed over the normalized text rather than the raw
//! HTML, so CMS noise (reflowed whitespace, comments, reordered attributes)
//! does not register as a change.

use scraper::node::Text;
use scraper::{Html, Node};
use sha2::{Digest, Sha256};

use crate::error::SyncError;
use crate::models::{ArticleContent, NormalizedArticle};

/// Elements whose whole subtree carries no article text.
const NON_CONTENT_ELEMENTS: &[&str] = &["script", "style", "meta", "link", "noscript"];

/// html2text wraps at this width; large enough to never wrap in practice.
const NO_WRAP_WIDTH: usize = 10_000;

pub fn header_line(url: &str) -> String {
    format!("Article URL: {url}")
}

/// Normalizes a fetched article, failing when the body contributes nothing.
pub fn normalize(content: &ArticleContent) -> Result<NormalizedArticle, SyncError> {
    let body = content.body.as_deref().unwrap_or_default();
    let markdown = to_markdown(body, &content.html_url);

    if markdown.is_empty() || markdown == header_line(&content.html_url) {
        return Err(SyncError::content_empty(content.id));
    }

    Ok(NormalizedArticle {
        fingerprint: fingerprint(&markdown),
        markdown,
    })
}

/// Converts markup to Markdown prefixed with the source URL header.
///
/// Returns just the header line when the markup has no text.
pub fn to_markdown(html: &str, url: &str) -> String {
    let body = if html.trim().is_empty() {
        String::new()
    } else {
        let cleaned = strip_non_content(html);
        collapse_blank_lines(&html2text::from_read(cleaned.as_bytes(), NO_WRAP_WIDTH))
    };

    if body.is_empty() {
        header_line(url)
    } else {
        format!("{}\n\n{}", header_line(url), body)
    }
}

/// Hex SHA-256 of the normalized text.
pub fn fingerprint(markdown: &str) -> String {
    hex::encode(Sha256::digest(markdown.as_bytes()))
}

/// Drops non-content subtrees and rewrites `<img>` as Markdown image text,
/// which html2text would otherwise reduce to the bare alt text.
fn strip_non_content(html: &str) -> String {
    let mut document = Html::parse_fragment(html);

    let doomed: Vec<_> = document
        .tree
        .nodes()
        .filter(|node| {
            node.value()
                .as_element()
                .is_some_and(|el| NON_CONTENT_ELEMENTS.contains(&el.name()))
        })
        .map(|node| node.id())
        .collect();

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let images: Vec<_> = document
        .tree
        .nodes()
        .filter_map(|node| {
            let el = node.value().as_element()?;
            (el.name() == "img").then(|| {
                (
                    node.id(),
                    el.attr("alt").unwrap_or_default().trim().to_string(),
                    el.attr("src").unwrap_or_default().trim().to_string(),
                )
            })
        })
        .collect();

    for (id, alt, src) in images {
        if let Some(mut node) = document.tree.get_mut(id) {
            if !src.is_empty() {
                node.insert_before(Node::Text(Text {
                    text: format!("![{alt}]({src})").into(),
                }));
            }
            node.detach();
        }
    }

    document.root_element().inner_html()
}

/// Trims trailing whitespace and squeezes runs of blank lines to one.
fn collapse_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut prev_empty = false;

    for line in text.lines() {
        let line = line.trim_end();
        let is_empty = line.is_empty();
        if is_empty && prev_empty {
            continue;
        }
        lines.push(line);
        prev_empty = is_empty;
    }

    lines.join("\n").trim().to_string()
}
