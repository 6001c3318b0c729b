//! Token-efficient text rendering for tool output
//!
//! Everything here is a pure function over search records, fetch windows or
//! member payloads. Upstream records are read leniently: a missing field
//! falls back to a neutral default instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::content::window::{percent_complete, TruncationWindow};
use crate::search::request::{DateFilter, SearchRequest};

/// Separator between rendered records
const RECORD_SEPARATOR: &str = "\n----------\n";

/// Longest description/content snippet shown per search result
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Profile fields shown by `fetch_member`, with their display labels.
/// Anything not listed here is left out.
pub const PROFILE_FIELDS: &[(&str, &str)] = &[
    ("title", "Job Title"),
    ("department", "Department"),
    ("i_report_to_email", "Manager Email"),
    ("office_location", "Office"),
    ("desk_number", "Desk"),
    ("busphone", "Work Phone"),
    ("extension", "Extension"),
    ("cellphone", "Mobile"),
    ("work_start_date", "Start Date"),
];

/// Profile values the directory uses for "not set"
const NULL_PROFILE_VALUES: &[&str] = &["null", "https://bluejeans.com/null"];

/// Display label for a whitelisted profile field
pub fn profile_label(field: &str) -> Option<&'static str> {
    PROFILE_FIELDS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, label)| *label)
}

/// One page slot of a multi-page fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub markdown: String,
    pub error: Option<String>,
}

fn str_field<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Render a scalar JSON value the way it reads in prose
fn display_value(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Shorten `text` to at most `max_chars` characters, cutting back to the last
/// whole word and appending `...`.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    let kept = match cut.rsplit_once(' ') {
        Some((head, _)) => head,
        None => cut.as_str(),
    };
    format!("{}...", kept)
}

/// Normalize an ISO-8601 timestamp to `YYYY-MM-DD`
pub fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }

    let bytes = raw.as_bytes();
    if bytes.len() >= 10 && bytes[4] == b'-' && bytes[7] == b'-' && raw.is_char_boundary(10) {
        return raw[..10].to_string();
    }
    raw.to_string()
}

/// `Date Filter: ...` header fragment, `None` when no filter applies
pub fn format_date_filter(filter: &DateFilter) -> Option<String> {
    match filter {
        DateFilter::None => None,
        DateFilter::Relative(window) => {
            let title: Vec<String> = window
                .key()
                .split('_')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect();
            Some(format!("Date Filter: {}", title.join(" ")))
        }
        DateFilter::Custom { from, to } => Some(format!(
            "Date Filter: {} to {}",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        )),
    }
}

fn format_search_header(request: &SearchRequest, total_found: usize) -> String {
    let query = match &request.query {
        Some(q) => format!("\"{}\"", q),
        None => "All".to_string(),
    };
    let applications = if request.applications.is_empty() {
        "All".to_string()
    } else {
        request
            .applications
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let limit = request
        .limit
        .map_or_else(|| "None".to_string(), |l| l.to_string());

    let mut parts = vec![format!("Applications: {}", applications)];
    if let Some(date_filter) = format_date_filter(&request.date_filter) {
        parts.push(date_filter);
    }
    if let Some(parent) = &request.parent_href {
        parts.push(format!("Parent: {}", parent));
    }
    parts.push("Sort: default".to_string());
    parts.push(format!("Limit: {}", limit));
    parts.push(format!("Total Results Found: {}", total_found));

    format!(
        "Search Results for Query: {} ({}):",
        query,
        parts.join(" | ")
    )
}

fn format_single_result(record: &Value) -> String {
    let mut lines = vec![
        format!("Title: {}", str_field(record, "title").unwrap_or("Untitled")),
        format!("Type: {}", str_field(record, "type").unwrap_or("unknown")),
        format!("URL: {}", str_field(record, "full_url").unwrap_or("")),
    ];

    if let Some(modified) = str_field(record, "modified_date").filter(|d| !d.is_empty()) {
        lines.push(format!("Last Modified: {}", format_date(modified)));
    }

    let description = str_field(record, "description").unwrap_or("").trim();
    let content = str_field(record, "content").unwrap_or("").trim();
    if !description.is_empty() {
        lines.push(format!(
            "Description: {}",
            truncate_text(description, SNIPPET_MAX_CHARS)
        ));
    } else if !content.is_empty() {
        lines.push(format!(
            "Content: {}",
            truncate_text(content, SNIPPET_MAX_CHARS)
        ));
    }

    lines.push(format!(
        "Views: {} | Comments: {} | Likes: {}",
        display_value(record.get("views_count"), "0"),
        display_value(record.get("comments_count"), "0"),
        display_value(record.get("likes_count"), "0"),
    ));

    let labels: Vec<String> = match record.get("labels") {
        Some(Value::Object(map)) => map.values().map(|v| display_value(Some(v), "")).collect(),
        Some(Value::Array(items)) => items.iter().map(|v| display_value(Some(v), "")).collect(),
        _ => Vec::new(),
    };
    if !labels.is_empty() {
        lines.push(format!("Labels: {}", labels.join(", ")));
    }

    if record.get("is_recommended").and_then(Value::as_bool) == Some(true) {
        lines.push("* This item is recommended".to_string());
    }
    if record.get("is_archived").and_then(Value::as_bool) == Some(true) {
        lines.push("* This item is archived".to_string());
    }

    lines.join("\n")
}

/// Render search records under a header describing the search
pub fn format_search_results(results: &[Value], request: &SearchRequest, total_found: usize) -> String {
    let header = format_search_header(request, total_found);
    if results.is_empty() {
        return format!("{}\n\nNo results found.", header);
    }

    let mut out = header;
    for record in results {
        out.push_str(RECORD_SEPARATOR);
        out.push_str(&format_single_result(record));
    }
    out.push_str("\n----------");
    out
}

/// Header plus converted content for a single fetched page
pub fn format_fetch_result(url: &str, markdown: &str, start_index: Option<usize>) -> String {
    let mut lines = vec![
        "# Fetched Content".to_string(),
        String::new(),
        format!("URL: {}", url),
    ];
    if let Some(start) = start_index.filter(|s| *s > 0) {
        lines.push(format!("Reading from offset: {}", group_thousands(start)));
    }
    lines.extend(["", "---", "", ""].map(String::from));
    lines.join("\n") + markdown
}

/// Render each page of a multi-page fetch, errors in place
pub fn format_fetch_results(pages: &[FetchedPage], total_count: usize) -> String {
    if pages.is_empty() {
        return "No pages to display.".to_string();
    }

    pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let url = if page.url.is_empty() {
                "Unknown URL"
            } else {
                page.url.as_str()
            };
            let header = format!("===== PAGE {} of {} =====\nURL: {}\n", i + 1, total_count, url);
            match &page.error {
                Some(error) => format!("{}\n[Error fetching page: {}]\n", header, error),
                None => format!("{}\n{}\n", header, page.markdown),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Footer telling the caller how far it got and how to continue
pub fn format_truncation_metadata(window: &TruncationWindow, url: &str) -> String {
    let pct = percent_complete(window.chars_returned, window.chars_total);
    let mut lines = vec![
        String::new(),
        "---".to_string(),
        String::new(),
        "⚠️ CONTENT TRUNCATED".to_string(),
        format!(
            "Showing {} of {} chars ({}% of document)",
            group_thousands(window.chars_returned),
            group_thousands(window.chars_total),
            pct
        ),
    ];

    if let Some(path) = &window.current_path {
        lines.push(format!("Current section: {}", path));
    }
    if !window.remaining_sections.is_empty() {
        lines.push(format!(
            "Upcoming sections: {}",
            window.remaining_sections.join(", ")
        ));
    }
    if let Some(next) = window.next_start_index {
        lines.push(String::new());
        lines.push("To continue reading, call fetch with start_index:".to_string());
        lines.push(format!("  fetch(url=\"{}\", start_index={})", url, next));
    }

    lines.join("\n")
}

fn member_full_name(member: &Value) -> &str {
    member
        .pointer("/name/fullName")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
}

/// Basic member listing; use [`format_member_profile`] for details
pub fn format_member_search_results(results: &[Value], query: &str) -> String {
    let header = format!(
        "Members found for query: \"{}\" (Total Results Found: {}):",
        query,
        results.len()
    );
    if results.is_empty() {
        return format!("{}\n\nNo results found.", header);
    }

    let mut out = header;
    for member in results {
        out.push_str(RECORD_SEPARATOR);
        out.push_str(&format!(
            "Name: {}\nEmail: {}\nMember ID: {}",
            member_full_name(member),
            display_value(member.get("email"), "N/A"),
            display_value(member.get("id"), "N/A"),
        ));
    }
    out.push_str("\n----------");
    out
}

/// Detailed profile from the member record and its raw `{Name, Value}` items
pub fn format_member_profile(
    member: &Value,
    profile_items: &[Value],
    manager_name: Option<&str>,
    community_url: &str,
) -> String {
    let full_name = member_full_name(member);
    let username = str_field(member, "namespace").filter(|u| !u.is_empty());
    let profile_url = match username {
        Some(user) if !community_url.is_empty() => format!("{}/.profile/{}", community_url, user),
        _ => "N/A".to_string(),
    };

    let mut lines = vec![
        format!("Member Profile: {}", full_name),
        "----------".to_string(),
        format!("Name: {}", full_name),
        format!("Email: {}", display_value(member.get("email"), "N/A")),
        format!("Username: {}", username.unwrap_or("N/A")),
        format!("Profile URL: {}", profile_url),
    ];

    if let Some(manager) = manager_name.filter(|m| !m.is_empty()) {
        lines.push(format!("Manager Name: {}", manager));
    }

    for item in profile_items {
        let field = str_field(item, "Name").unwrap_or("");
        let value = display_value(item.get("Value"), "");
        if value.is_empty() || NULL_PROFILE_VALUES.contains(&value.as_str()) {
            continue;
        }
        let Some(label) = profile_label(field) else {
            continue;
        };
        // Dates arrive as "M/D/YYYY 12:00:00 AM"
        let value = if field.contains("date") {
            value.split(' ').next().unwrap_or("").to_string()
        } else {
            value
        };
        lines.push(format!("{}: {}", label, value));
    }

    lines.push("----------".to_string());
    lines.join("\n")
}
