//! Character windows over converted documents
//!
//! A fetch returns at most `max_chars` characters starting at `start_index`,
//! together with a [`TruncationWindow`] telling the caller where to resume.
//! Nothing is kept between calls: feeding `next_start_index` back in against
//! the same document yields contiguous, non-overlapping windows until the
//! status becomes [`WindowStatus::Complete`].

use serde::{Deserialize, Serialize};

/// A heading in a document's table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub level: usize,
    pub title: String,
    /// Ancestor titles joined with ` > `, ending with this title
    pub path: String,
    /// Character offset of the heading line
    pub start: usize,
}

/// Converted page text plus an optional table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchableDocument {
    text: String,
    char_len: usize,
    sections: Option<Vec<Section>>,
}

impl FetchableDocument {
    /// Document without a table of contents
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self {
            text,
            char_len,
            sections: None,
        }
    }

    /// Document with an explicit table of contents (ordered by `start`)
    pub fn with_sections(text: impl Into<String>, sections: Vec<Section>) -> Self {
        let mut doc = Self::new(text);
        doc.sections = Some(sections);
        doc
    }

    /// Document whose table of contents is read from markdown `#` headings.
    /// Text without headings gets no table of contents.
    pub fn from_markdown(text: impl Into<String>) -> Self {
        let mut doc = Self::new(text);
        let sections = markdown_sections(&doc.text);
        if !sections.is_empty() {
            doc.sections = Some(sections);
        }
        doc
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    pub fn sections(&self) -> Option<&[Section]> {
        self.sections.as_deref()
    }
}

fn markdown_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut offset = 0;
    let mut in_fence = false;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.chars().count();

        let trimmed = line.trim_end();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        let hashes = trimmed.chars().take_while(|c| *c == '#').count();
        let title = trimmed[hashes..].trim();

        if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') && !title.is_empty() {
            while stack.last().is_some_and(|(level, _)| *level >= hashes) {
                stack.pop();
            }
            stack.push((hashes, title.to_string()));
            let path = stack
                .iter()
                .map(|(_, t)| t.as_str())
                .collect::<Vec<_>>()
                .join(" > ");
            sections.push(Section {
                level: hashes,
                title: title.to_string(),
                path,
                start: line_start,
            });
        }
    }

    sections
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowStatus {
    Complete,
    Partial,
}

impl WindowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowStatus::Complete => "complete",
            WindowStatus::Partial => "partial",
        }
    }
}

/// What one fetch returned and how to continue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationWindow {
    pub status: WindowStatus,
    pub chars_returned: usize,
    pub chars_total: usize,
    pub current_path: Option<String>,
    pub remaining_sections: Vec<String>,
    /// Present iff `status` is `Partial`
    pub next_start_index: Option<usize>,
}

impl TruncationWindow {
    pub fn is_partial(&self) -> bool {
        self.status == WindowStatus::Partial
    }
}

/// `floor(100 * returned / total)`, or 0 for an empty document
pub fn percent_complete(chars_returned: usize, chars_total: usize) -> u32 {
    if chars_total == 0 {
        return 0;
    }
    let pct = (chars_returned as u128 * 100) / chars_total as u128;
    pct.min(100) as u32
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Cut the window `[start_index, start_index + max_chars)` out of `document`.
///
/// A `start_index` at or past the end yields an empty, complete window.
pub fn window(
    document: &FetchableDocument,
    start_index: usize,
    max_chars: usize,
) -> (&str, TruncationWindow) {
    let chars_total = document.len();
    let start = start_index.min(chars_total);
    let chars_returned = max_chars.min(chars_total - start);
    let end = start + chars_returned;

    let text = document.text();
    let begin_byte = byte_offset(text, start);
    let end_byte = begin_byte + byte_offset(&text[begin_byte..], chars_returned);
    let slice = &text[begin_byte..end_byte];

    let (status, next_start_index) = if start_index.saturating_add(chars_returned) >= chars_total {
        (WindowStatus::Complete, None)
    } else {
        (WindowStatus::Partial, Some(end))
    };

    let (current_path, remaining_sections) = match document.sections() {
        Some(sections) => (
            sections
                .iter()
                .take_while(|s| s.start <= end)
                .last()
                .map(|s| s.path.clone()),
            sections
                .iter()
                .filter(|s| s.start > end)
                .map(|s| s.title.clone())
                .collect(),
        ),
        None => (None, Vec::new()),
    };

    (
        slice,
        TruncationWindow {
            status,
            chars_returned,
            chars_total,
            current_path,
            remaining_sections,
            next_start_index,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(title: &str, path: &str, start: usize) -> Section {
        Section {
            level: 1,
            title: title.to_string(),
            path: path.to_string(),
            start,
        }
    }

    #[test]
    fn first_window_of_large_document() {
        let doc = FetchableDocument::new("x".repeat(125_000));
        let (text, win) = window(&doc, 0, 49_800);

        assert_eq!(text.len(), 49_800);
        assert_eq!(win.status, WindowStatus::Partial);
        assert_eq!(win.chars_returned, 49_800);
        assert_eq!(win.chars_total, 125_000);
        assert_eq!(win.next_start_index, Some(49_800));
        assert_eq!(percent_complete(win.chars_returned, win.chars_total), 39);
        assert!(win.current_path.is_none());
        assert!(win.remaining_sections.is_empty());
    }

    #[test]
    fn windows_reassemble_document_exactly() {
        let body: String = (0..997)
            .map(|i| format!("línea {} ✓ ", i))
            .collect();
        let doc = FetchableDocument::from_markdown(format!("# Start\n{}\n## End\nfin", body));

        for max_chars in [1, 7, 100, 4096, doc.len(), doc.len() + 5] {
            let mut rebuilt = String::new();
            let mut start = 0;
            let mut calls = 0;
            loop {
                let (text, win) = window(&doc, start, max_chars);
                rebuilt.push_str(text);
                calls += 1;
                match win.next_start_index {
                    Some(next) => {
                        assert_eq!(win.status, WindowStatus::Partial);
                        assert_eq!(next, start + win.chars_returned);
                        start = next;
                    }
                    None => {
                        assert_eq!(win.status, WindowStatus::Complete);
                        break;
                    }
                }
            }
            assert_eq!(rebuilt, doc.text(), "max_chars={}", max_chars);
            assert_eq!(calls, (doc.len() + max_chars - 1) / max_chars);
        }
    }

    #[test]
    fn same_start_index_is_idempotent() {
        let doc = FetchableDocument::from_markdown("# A\nalpha\n# B\nbeta\n");
        assert_eq!(window(&doc, 3, 5), window(&doc, 3, 5));
    }

    #[test]
    fn start_past_end_is_complete_and_empty() {
        let doc = FetchableDocument::new("short");
        for start in [5, 6, 1_000, usize::MAX] {
            let (text, win) = window(&doc, start, 10);
            assert_eq!(text, "");
            assert_eq!(win.status, WindowStatus::Complete);
            assert_eq!(win.chars_returned, 0);
            assert_eq!(win.chars_total, 5);
            assert!(win.next_start_index.is_none());
        }
    }

    #[test]
    fn empty_document_is_complete() {
        let doc = FetchableDocument::new("");
        let (text, win) = window(&doc, 0, 100);
        assert_eq!(text, "");
        assert_eq!(win.status, WindowStatus::Complete);
        assert_eq!(percent_complete(win.chars_returned, win.chars_total), 0);
    }

    #[test]
    fn zero_budget_leaves_position_unchanged() {
        let doc = FetchableDocument::new("abc");
        let (text, win) = window(&doc, 1, 0);
        assert_eq!(text, "");
        assert_eq!(win.status, WindowStatus::Partial);
        assert_eq!(win.next_start_index, Some(1));
    }

    #[test]
    fn percentage_stays_in_bounds() {
        assert_eq!(percent_complete(0, 0), 0);
        assert_eq!(percent_complete(0, 10), 0);
        assert_eq!(percent_complete(10, 10), 100);
        assert_eq!(percent_complete(1, 3), 33);
        assert_eq!(percent_complete(2, 3), 66);
        assert_eq!(percent_complete(usize::MAX, usize::MAX), 100);
        for total in 1..60 {
            for returned in 0..=total {
                assert!(percent_complete(returned, total) <= 100);
            }
        }
    }

    #[test]
    fn sections_track_position() {
        let doc = FetchableDocument::with_sections(
            "a".repeat(100),
            vec![
                section("Intro", "Intro", 0),
                section("Usage", "Intro > Usage", 40),
                section("FAQ", "FAQ", 80),
            ],
        );

        let (_, win) = window(&doc, 0, 30);
        assert_eq!(win.current_path.as_deref(), Some("Intro"));
        assert_eq!(win.remaining_sections, vec!["Usage", "FAQ"]);

        let (_, win) = window(&doc, 30, 10);
        // Window end lands exactly on the Usage heading
        assert_eq!(win.current_path.as_deref(), Some("Intro > Usage"));
        assert_eq!(win.remaining_sections, vec!["FAQ"]);

        let (_, win) = window(&doc, 40, 100);
        assert_eq!(win.current_path.as_deref(), Some("FAQ"));
        assert!(win.remaining_sections.is_empty());
    }

    #[test]
    fn window_before_first_section_has_no_path() {
        let doc = FetchableDocument::with_sections("a".repeat(50), vec![section("Late", "Late", 20)]);
        let (_, win) = window(&doc, 0, 10);
        assert!(win.current_path.is_none());
        assert_eq!(win.remaining_sections, vec!["Late"]);
    }

    #[test]
    fn markdown_headings_become_hierarchical_sections() {
        let doc = FetchableDocument::from_markdown(
            "# Guide\nintro\n## Install\n### Linux\nsteps\n## Upgrade\n#hashtag\n# Appendix\n",
        );
        let sections = doc.sections().unwrap();
        let paths: Vec<&str> = sections.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "Guide",
                "Guide > Install",
                "Guide > Install > Linux",
                "Guide > Upgrade",
                "Appendix"
            ]
        );
        assert_eq!(sections[0].start, 0);
        assert_eq!(sections[1].start, "# Guide\nintro\n".chars().count());
        assert_eq!(sections[2].level, 3);

        assert!(FetchableDocument::from_markdown("no headings here").sections().is_none());
    }

    #[test]
    fn section_offsets_count_characters_not_bytes() {
        let doc = FetchableDocument::from_markdown("ééé\n# Next\n");
        assert_eq!(doc.sections().unwrap()[0].start, 4);
        assert_eq!(doc.len(), 11);
    }

    #[test]
    fn fenced_code_and_escaped_hashes_are_not_sections() {
        let doc = FetchableDocument::from_markdown(
            "# Setup\n```\n# install deps\n```\n\\# 1 rule\n## Run\n",
        );
        let sections = doc.sections().unwrap();
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Setup", "Run"]);
        assert_eq!(
            sections[1].start,
            "# Setup\n```\n# install deps\n```\n\\# 1 rule\n".chars().count()
        );
    }
}
