//! HTML to markdown conversion for fetched pages
//!
//! Igloo frontend pages are full HTML documents. The converter keeps the main
//! content region, drops chrome and scripts, and renders headings, links,
//! emphasis and lists as markdown so the table of contents can be read back
//! from `#` headings. Only `<hN>` elements produce heading lines: body text
//! that starts with `#` is escaped as `\#`, and `<pre>` blocks become fenced
//! code with their line breaks intact.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::window::FetchableDocument;

/// Marks a slot where a preformatted block is restored after conversion
const PRE_SLOT: char = '\u{E000}';
/// Prefixes lines produced from `<hN>` until escaping is done
const HEADING_MARK: char = '\u{E001}';

struct Patterns {
    main: Regex,
    article: Regex,
    body: Regex,
    comment: Regex,
    dropped: Vec<Regex>,
    pre: Regex,
    pre_slot: Regex,
    whitespace: Regex,
    heading: Regex,
    link: Regex,
    bold: Regex,
    italic: Regex,
    code: Regex,
    list_item: Regex,
    line_break: Regex,
    cell_end: Regex,
    block: Regex,
    any_tag: Regex,
    numeric_entity: Regex,
    blank_lines: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static pattern");
        Patterns {
            main: re(r"(?is)<main\b[^>]*>(.*)</main>"),
            article: re(r"(?is)<article\b[^>]*>(.*)</article>"),
            body: re(r"(?is)<body\b[^>]*>(.*)</body>"),
            comment: re(r"(?s)<!--.*?-->"),
            dropped: ["script", "style", "noscript", "head", "nav", "footer", "svg", "template"]
                .iter()
                .map(|tag| re(&format!(r"(?is)<{0}\b[^>]*>.*?</{0}\s*>", tag)))
                .collect(),
            pre: re(r"(?is)<pre\b[^>]*>(.*?)</pre\s*>"),
            pre_slot: re(&format!("{0}([0-9]+){0}", PRE_SLOT)),
            whitespace: re(r"\s+"),
            heading: re(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>"),
            link: re(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#),
            bold: re(r"(?is)<(?:strong|b)\b[^>]*>(.*?)</(?:strong|b)\s*>"),
            italic: re(r"(?is)<(?:em|i)\b[^>]*>(.*?)</(?:em|i)\s*>"),
            code: re(r"(?is)<code\b[^>]*>(.*?)</code\s*>"),
            list_item: re(r"(?i)<li\b[^>]*>"),
            line_break: re(r"(?i)<br\s*/?>"),
            cell_end: re(r"(?i)</t[dh]\s*>"),
            block: re(
                r"(?i)</?(?:p|div|section|article|main|header|aside|ul|ol|table|thead|tbody|tr|blockquote|pre|dl|dt|dd|figure|figcaption|hr)\b[^>]*>",
            ),
            any_tag: re(r"(?s)<[^>]*>"),
            numeric_entity: re(r"(?i)&#(x[0-9a-f]+|[0-9]+);"),
            blank_lines: re(r"\n{3,}"),
        }
    })
}

fn strip_tags(html: &str) -> String {
    patterns().any_tag.replace_all(html, "").trim().to_string()
}

/// Decode the entities pages actually use
pub fn decode_entities(text: &str) -> String {
    let decoded = patterns()
        .numeric_entity
        .replace_all(text, |caps: &Captures| {
            let raw = &caps[1];
            let code = match raw.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => raw.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), |c| c.to_string())
        });

    decoded
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&hellip;", "\u{2026}")
        .replace("&amp;", "&")
}

/// Pick the most specific content region of a page
fn content_region(html: &str) -> &str {
    let p = patterns();
    for pattern in [&p.main, &p.article, &p.body] {
        if let Some(inner) = pattern.captures(html).and_then(|c| c.get(1)) {
            return inner.as_str();
        }
    }
    html
}

/// Convert an HTML page to markdown text
pub fn html_to_markdown(html: &str) -> String {
    let p = patterns();

    let mut text = p.comment.replace_all(html, "").into_owned();
    for pattern in &p.dropped {
        text = pattern.replace_all(&text, "").into_owned();
    }
    let text = content_region(&text).to_string();

    // Preformatted blocks skip whitespace collapsing and markup rewriting
    let mut preformatted = Vec::new();
    let text = p.pre.replace_all(&text, |caps: &Captures| {
        let code = decode_entities(&p.any_tag.replace_all(&caps[1], ""));
        preformatted.push(code.trim_matches(['\r', '\n']).to_string());
        format!("<pre>{0}{1}{0}</pre>", PRE_SLOT, preformatted.len() - 1)
    });
    let text = p.whitespace.replace_all(&text, " ");

    let text = p.heading.replace_all(&text, |caps: &Captures| {
        let level: usize = caps[1].parse().unwrap_or(1);
        let title = strip_tags(&caps[2]);
        if title.is_empty() {
            "\n".to_string()
        } else {
            format!("\n\n{}{} {}\n\n", HEADING_MARK, "#".repeat(level), title)
        }
    });
    let text = p.link.replace_all(&text, |caps: &Captures| {
        let href = caps[1].trim();
        let label = strip_tags(&caps[2]);
        if label.is_empty() {
            String::new()
        } else if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            label
        } else {
            format!("[{}]({})", label, href)
        }
    });
    let text = p.bold.replace_all(&text, |caps: &Captures| wrap(&caps[1], "**"));
    let text = p.italic.replace_all(&text, |caps: &Captures| wrap(&caps[1], "*"));
    let text = p.code.replace_all(&text, |caps: &Captures| wrap(&caps[1], "`"));
    let text = p.list_item.replace_all(&text, "\n- ");
    let text = p.line_break.replace_all(&text, "\n");
    let text = p.cell_end.replace_all(&text, " | ");
    let text = p.block.replace_all(&text, "\n\n");
    let text = p.any_tag.replace_all(&text, "");
    let text = decode_entities(&text);

    let lines: Vec<String> = text.lines().map(escape_line).collect();
    let text = lines.join("\n");
    let text = p.blank_lines.replace_all(&text, "\n\n");
    let text = p.pre_slot.replace_all(text.trim(), |caps: &Captures| {
        let code = caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|i| preformatted.get(i))
            .map_or("", String::as_str);
        format!("```\n{}\n```", code)
    });
    text.into_owned()
}

/// Trim a line and keep a leading `#` from reading as a heading unless the
/// line came from an `<hN>` element
fn escape_line(line: &str) -> String {
    let line = line.trim();
    match line.strip_prefix(HEADING_MARK) {
        Some(heading) => heading.to_string(),
        None if line.starts_with('#') => format!("\\{}", line),
        None => line.to_string(),
    }
}

fn wrap(inner: &str, marker: &str) -> String {
    let inner = inner.trim();
    if inner.is_empty() {
        String::new()
    } else {
        format!("{0}{1}{0}", marker, inner)
    }
}

/// Convert a page and index its headings
pub fn to_document(html: &str) -> FetchableDocument {
    FetchableDocument::from_markdown(html_to_markdown(html))
}
