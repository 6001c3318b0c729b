//! Search request model and its query-string encoding

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Date format the search API expects for `updatedFrom` / `updatedTo`
pub const API_DATE_FORMAT: &str = "%m-%d-%Y";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Both 'updated_from' and 'updated_to' must be provided for a custom date range")]
    IncompleteDateRange,
    #[error("Unknown application type: {0}")]
    UnknownApplication(String),
    #[error("Unknown date filter: {0}")]
    UnknownDateWindow(String),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Igloo application kinds, OR-combined in a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    Blog,
    Wiki,
    Document,
    Forum,
    Gallery,
    Calendar,
    Pages,
    People,
    Space,
    Microblog,
}

impl ApplicationType {
    pub const ALL: [ApplicationType; 10] = [
        ApplicationType::Blog,
        ApplicationType::Wiki,
        ApplicationType::Document,
        ApplicationType::Forum,
        ApplicationType::Gallery,
        ApplicationType::Calendar,
        ApplicationType::Pages,
        ApplicationType::People,
        ApplicationType::Space,
        ApplicationType::Microblog,
    ];

    /// Numeric value used on the wire
    pub fn code(&self) -> u8 {
        match self {
            ApplicationType::Blog => 1,
            ApplicationType::Wiki => 2,
            ApplicationType::Document => 3,
            ApplicationType::Forum => 4,
            ApplicationType::Gallery => 5,
            ApplicationType::Calendar => 6,
            ApplicationType::Pages => 7,
            ApplicationType::People => 8,
            ApplicationType::Space => 9,
            ApplicationType::Microblog => 10,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApplicationType::Blog => "blog",
            ApplicationType::Wiki => "wiki",
            ApplicationType::Document => "document",
            ApplicationType::Forum => "forum",
            ApplicationType::Gallery => "gallery",
            ApplicationType::Calendar => "calendar",
            ApplicationType::Pages => "pages",
            ApplicationType::People => "people",
            ApplicationType::Space => "space",
            ApplicationType::Microblog => "microblog",
        }
    }

    /// Parse a comma-separated list such as `"wiki, blog"`
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, SearchError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApplicationType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|app| app.name() == wanted || app.code().to_string() == wanted)
            .ok_or_else(|| SearchError::UnknownApplication(s.to_string()))
    }
}

/// Named relative "last updated" windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeWindow {
    PastHour,
    Past24Hours,
    PastWeek,
    PastMonth,
    PastYear,
}

impl RelativeWindow {
    pub fn api_value(&self) -> &'static str {
        match self {
            RelativeWindow::PastHour => "pastHour",
            RelativeWindow::Past24Hours => "pastTwentyFourHours",
            RelativeWindow::PastWeek => "pastWeek",
            RelativeWindow::PastMonth => "pastMonth",
            RelativeWindow::PastYear => "pastYear",
        }
    }

    /// Snake-case name used by tool arguments (`past_week`)
    pub fn key(&self) -> &'static str {
        match self {
            RelativeWindow::PastHour => "past_hour",
            RelativeWindow::Past24Hours => "past_24_hours",
            RelativeWindow::PastWeek => "past_week",
            RelativeWindow::PastMonth => "past_month",
            RelativeWindow::PastYear => "past_year",
        }
    }
}

impl FromStr for RelativeWindow {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "past_hour" | "pasthour" => Ok(RelativeWindow::PastHour),
            "past_24_hours" | "pasttwentyfourhours" | "past_day" => Ok(RelativeWindow::Past24Hours),
            "past_week" | "pastweek" => Ok(RelativeWindow::PastWeek),
            "past_month" | "pastmonth" => Ok(RelativeWindow::PastMonth),
            "past_year" | "pastyear" => Ok(RelativeWindow::PastYear),
            _ => Err(SearchError::UnknownDateWindow(s.to_string())),
        }
    }
}

/// "Last updated" filter. A custom range always carries both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    None,
    Relative(RelativeWindow),
    Custom { from: NaiveDate, to: NaiveDate },
}

impl DateFilter {
    /// Build a custom range from optional bounds; both are required.
    pub fn custom(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, SearchError> {
        match (from, to) {
            (Some(from), Some(to)) => Ok(DateFilter::Custom { from, to }),
            _ => Err(SearchError::IncompleteDateRange),
        }
    }

    /// Build a filter from tool-style inputs: a window name (or `custom_range`)
    /// plus optional `YYYY-MM-DD` bounds.
    pub fn parse(
        kind: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Self, SearchError> {
        let Some(kind) = kind.map(str::trim).filter(|k| !k.is_empty()) else {
            return Ok(DateFilter::None);
        };
        match kind.to_ascii_lowercase().as_str() {
            "custom_range" | "daterange" | "custom" => {
                DateFilter::custom(parse_date(from)?, parse_date(to)?)
            }
            other => other.parse().map(DateFilter::Relative),
        }
    }

    /// Value for the `updatedDateType` parameter
    pub fn api_value(&self) -> Option<&'static str> {
        match self {
            DateFilter::None => None,
            DateFilter::Relative(window) => Some(window.api_value()),
            DateFilter::Custom { .. } => Some("dateRange"),
        }
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, SearchError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| SearchError::InvalidDate(s.to_string())),
    }
}

/// One logical search. Build with [`SearchRequest::new`] and the `with_*` setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub applications: Vec<ApplicationType>,
    pub parent_href: Option<String>,
    pub search_all: bool,
    pub include_microblog: bool,
    pub include_archived: bool,
    pub date_filter: DateFilter,
    pub page_size: Option<usize>,
    pub limit: Option<usize>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            applications: Vec::new(),
            parent_href: None,
            search_all: true,
            include_microblog: true,
            include_archived: false,
            date_filter: DateFilter::None,
            page_size: None,
            limit: None,
        }
    }
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = (!query.trim().is_empty()).then_some(query);
        self
    }

    pub fn with_applications(mut self, applications: Vec<ApplicationType>) -> Self {
        self.applications = applications;
        self
    }

    pub fn with_parent_href(mut self, parent_href: impl Into<String>) -> Self {
        let parent = parent_href.into();
        self.parent_href = (!parent.trim().is_empty()).then_some(parent);
        self
    }

    pub fn with_search_all(mut self, search_all: bool) -> Self {
        self.search_all = search_all;
        self
    }

    pub fn with_include_microblog(mut self, include: bool) -> Self {
        self.include_microblog = include;
        self
    }

    pub fn with_include_archived(mut self, include: bool) -> Self {
        self.include_archived = include;
        self
    }

    pub fn with_date_filter(mut self, filter: DateFilter) -> Self {
        self.date_filter = filter;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Query parameters shared by every page of this search (no `offset`)
    pub fn query_params(&self, page_size: usize) -> Vec<(String, String)> {
        let mut params = vec![("limit".to_string(), page_size.to_string())];

        if let Some(query) = &self.query {
            params.push(("query".to_string(), query.clone()));
        }
        if !self.applications.is_empty() {
            let codes: Vec<String> = self
                .applications
                .iter()
                .map(|app| app.code().to_string())
                .collect();
            params.push(("applications".to_string(), codes.join(",")));
        }
        if let Some(parent) = &self.parent_href {
            params.push((
                "parentHref".to_string(),
                parent.trim_end_matches('/').to_string(),
            ));
        }

        params.push(("searchAll".to_string(), self.search_all.to_string()));
        params.push((
            "includeMicroblog".to_string(),
            self.include_microblog.to_string(),
        ));
        params.push((
            "includeArchived".to_string(),
            self.include_archived.to_string(),
        ));

        if let Some(kind) = self.date_filter.api_value() {
            params.push(("updatedDateType".to_string(), kind.to_string()));
        }
        if let DateFilter::Custom { from, to } = self.date_filter {
            params.push((
                "updatedFrom".to_string(),
                from.format(API_DATE_FORMAT).to_string(),
            ));
            params.push((
                "updatedTo".to_string(),
                to.format(API_DATE_FORMAT).to_string(),
            ));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn custom_range_requires_both_bounds() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert!(DateFilter::custom(Some(d), Some(d)).is_ok());
        assert_eq!(
            DateFilter::custom(Some(d), None),
            Err(SearchError::IncompleteDateRange)
        );
        assert_eq!(
            DateFilter::custom(None, Some(d)),
            Err(SearchError::IncompleteDateRange)
        );
        assert_eq!(
            DateFilter::parse(Some("custom_range"), Some("2025-01-02"), None),
            Err(SearchError::IncompleteDateRange)
        );
    }

    #[test]
    fn date_filter_parsing() {
        assert_eq!(DateFilter::parse(None, None, None), Ok(DateFilter::None));
        assert_eq!(
            DateFilter::parse(Some("past_week"), None, None),
            Ok(DateFilter::Relative(RelativeWindow::PastWeek))
        );
        assert!(matches!(
            DateFilter::parse(Some("last_decade"), None, None),
            Err(SearchError::UnknownDateWindow(_))
        ));
        assert!(matches!(
            DateFilter::parse(Some("custom_range"), Some("01/02/2025"), Some("2025-02-01")),
            Err(SearchError::InvalidDate(_))
        ));
    }

    #[test]
    fn application_parsing_accepts_names_and_codes() {
        assert_eq!(
            ApplicationType::parse_list("wiki, Blog,3").unwrap(),
            vec![
                ApplicationType::Wiki,
                ApplicationType::Blog,
                ApplicationType::Document
            ]
        );
        assert!(ApplicationType::parse_list("wiki,podcast").is_err());
        assert!(ApplicationType::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn default_params_follow_api_defaults() {
        let params = SearchRequest::new().query_params(50);
        assert_eq!(param(&params, "limit"), Some("50"));
        assert_eq!(param(&params, "searchAll"), Some("true"));
        assert_eq!(param(&params, "includeMicroblog"), Some("true"));
        assert_eq!(param(&params, "includeArchived"), Some("false"));
        assert_eq!(param(&params, "query"), None);
        assert_eq!(param(&params, "updatedDateType"), None);
        assert_eq!(param(&params, "offset"), None);
    }

    #[test]
    fn full_request_encodes_every_filter() {
        let from = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let request = SearchRequest::new()
            .with_query("release notes")
            .with_applications(vec![ApplicationType::Wiki, ApplicationType::Microblog])
            .with_parent_href("/spaces/eng/")
            .with_search_all(false)
            .with_include_archived(true)
            .with_date_filter(DateFilter::Custom { from, to });

        let params = request.query_params(25);
        assert_eq!(param(&params, "limit"), Some("25"));
        assert_eq!(param(&params, "query"), Some("release notes"));
        assert_eq!(param(&params, "applications"), Some("2,10"));
        assert_eq!(param(&params, "parentHref"), Some("/spaces/eng"));
        assert_eq!(param(&params, "searchAll"), Some("false"));
        assert_eq!(param(&params, "includeArchived"), Some("true"));
        assert_eq!(param(&params, "updatedDateType"), Some("dateRange"));
        assert_eq!(param(&params, "updatedFrom"), Some("03-04-2025"));
        assert_eq!(param(&params, "updatedTo"), Some("12-31-2025"));
    }

    #[test]
    fn blank_query_is_dropped() {
        let request = SearchRequest::new().with_query("   ");
        assert!(request.query.is_none());
    }
}
