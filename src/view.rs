//! Dashboard listing: search, pagination and link status.
//!
//! Everything here is a pure function of its inputs. The clock reading is a
//! parameter, so status is recomputed on every call and never cached.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};

use crate::models::ShortUrl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStatus {
    Active,
    Expired,
}

impl UrlStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Expired => "Expired",
        }
    }
}

/// `Expired` iff the link has an expiry strictly before `now`.
pub fn status_at(url: &ShortUrl, now: DateTime<Utc>) -> UrlStatus {
    match url.expires_at {
        Some(expires_at) if expires_at < now => UrlStatus::Expired,
        _ => UrlStatus::Active,
    }
}

/// Case-insensitive substring match on the original URL or the short code.
/// An empty term matches everything.
pub fn matches_search(url: &ShortUrl, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    url.original_url.to_lowercase().contains(&term) || url.short_code.to_lowercase().contains(&term)
}

/// Items matching `term`, in their original order.
pub fn filter<'a>(items: &'a [ShortUrl], term: &str) -> Vec<&'a ShortUrl> {
    items.iter().filter(|url| matches_search(url, term)).collect()
}

/// Public link for a short code, e.g. `http://localhost:5000/abc123`.
pub fn short_link(base_url: &str, short_code: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), short_code)
}

/// One listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<'a> {
    pub url: &'a ShortUrl,
    pub status: UrlStatus,
}

/// The visible page of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection<'a> {
    pub rows: Vec<Row<'a>>,
    /// `ceil(filtered / page_size)`; zero when nothing matches
    pub total_pages: usize,
    pub matched: usize,
}

impl Projection<'_> {
    /// Pager controls only make sense with more than one page.
    pub fn shows_pager(&self) -> bool {
        self.total_pages > 1
    }

    /// 1-based page numbers for the pager.
    pub fn page_numbers(&self) -> impl Iterator<Item = usize> {
        1..=self.total_pages
    }
}

/// Filter `items` by `term` and cut out the 1-based `page`.
///
/// A page past the end yields no rows; page 0 is treated as page 1.
pub fn project<'a>(
    items: &'a [ShortUrl],
    term: &str,
    page: usize,
    page_size: NonZeroUsize,
    now: DateTime<Utc>,
) -> Projection<'a> {
    let filtered = filter(items, term);
    let page_size = page_size.get();
    let matched = filtered.len();
    let total_pages = matched.div_ceil(page_size);

    let start = page.max(1).saturating_sub(1).saturating_mul(page_size);
    let rows = filtered
        .into_iter()
        .skip(start)
        .take(page_size)
        .map(|url| Row {
            url,
            status: status_at(url, now),
        })
        .collect();

    Projection {
        rows,
        total_pages,
        matched,
    }
}

/// UI-local listing inputs.
///
/// Changing the search term always returns to page 1, so a page number from
/// a larger result set is never carried over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingState {
    search_term: String,
    page: usize,
    page_size: NonZeroUsize,
}

impl ListingState {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            search_term: String::new(),
            page: 1,
            page_size,
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
    }

    pub fn go_to(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn project<'a>(&self, items: &'a [ShortUrl], now: DateTime<Utc>) -> Projection<'a> {
        project(items, &self.search_term, self.page, self.page_size, now)
    }
}
