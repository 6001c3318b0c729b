//! Bounded pagination over the search endpoint
//!
//! The first page is fetched on its own to learn `numFound`; every remaining
//! page is then requested concurrently and merged back in offset order. A
//! search of N pages therefore costs two sequential round trips.

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

/// One page of raw search records as returned by the server
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultPage {
    pub results: Vec<Value>,
    pub total_found: usize,
}

impl SearchResultPage {
    /// Read `{results, numFound}`. Absent `results` is an empty page; absent
    /// `numFound` counts only this page's records.
    pub fn from_json(body: &Value) -> Self {
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let total_found = body
            .get("numFound")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(results.len());
        Self {
            results,
            total_found,
        }
    }
}

/// Records collected for one search, in server order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<Value>,
    /// Server-reported match count from the first page
    pub total_found: usize,
}

/// Something that can produce a search page at a given offset
#[async_trait]
pub trait PageSource: Send + Sync {
    type Error: Send;

    async fn fetch_page(&self, offset: usize) -> Result<SearchResultPage, Self::Error>;
}

/// Offsets still to request after a first page of `first_len` records
pub fn remaining_offsets(first_len: usize, results_to_fetch: usize, page_size: usize) -> Vec<usize> {
    (first_len..results_to_fetch)
        .step_by(page_size.max(1))
        .collect()
}

/// Collect up to `limit` records (all matches when `None`).
///
/// `limit == Some(0)` returns before any request. A failure of any page
/// fails the whole call; no partial list is returned.
pub async fn paginate<S>(
    source: &S,
    page_size: usize,
    limit: Option<usize>,
) -> Result<SearchOutcome, S::Error>
where
    S: PageSource + ?Sized,
{
    if limit == Some(0) {
        debug!("search limit is 0, skipping all requests");
        return Ok(SearchOutcome::default());
    }

    let first = source.fetch_page(0).await?;
    let total_found = first.total_found;
    let mut results = first.results;

    if let Some(limit) = limit {
        if results.len() >= limit {
            results.truncate(limit);
            return Ok(SearchOutcome {
                results,
                total_found,
            });
        }
    }

    let results_to_fetch = limit.map_or(total_found, |l| l.min(total_found));
    let offsets = remaining_offsets(results.len(), results_to_fetch, page_size);
    debug!(
        total_found,
        results_to_fetch,
        pages = offsets.len(),
        "fetching remaining search pages"
    );

    // try_join_all keeps input order regardless of completion order
    let pages = try_join_all(offsets.iter().map(|&offset| source.fetch_page(offset))).await?;
    for page in pages {
        results.extend(page.results);
    }

    if let Some(limit) = limit {
        results.truncate(limit);
    }

    Ok(SearchOutcome {
        results,
        total_found,
    })
}
