//! Page-number pagination for list endpoints.
use actix_web::HttpRequest;
use serde::Serialize;
use url::Url;

use crate::server::errors::ApiError;

/// A page of results with links to its neighbours.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    /// Number of results across all pages.
    pub count: i64,
    /// Absolute URL of the next page.
    pub next: Option<String>,
    /// Absolute URL of the previous page.
    pub previous: Option<String>,
    /// Results on this page.
    pub results: Vec<T>,
}

/// Requested page, translated to `LIMIT`/`OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number.
    pub page: u64,
    /// Page size.
    pub limit: i64,
    /// Rows to skip.
    pub offset: i64,
}

impl PageWindow {
    /// Window for `page` (default 1) of `page_size` rows.
    ///
    /// # Errors
    /// Errors on page 0 or sizes that overflow.
    pub fn new(page: Option<u64>, page_size: u64) -> Result<Self, ApiError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::InvalidPage);
        }
        let limit = i64::try_from(page_size.max(1)).map_err(|_| ApiError::InvalidPage)?;
        let offset = i64::try_from(page - 1)
            .ok()
            .and_then(|index| index.checked_mul(limit))
            .ok_or(ApiError::InvalidPage)?;
        Ok(Self {
            page,
            limit,
            offset,
        })
    }

    /// Number of pages needed for `count` rows. An empty set has one page.
    #[must_use]
    pub fn page_count(&self, count: i64) -> u64 {
        let pages = (count.max(0) + self.limit - 1) / self.limit;
        u64::try_from(pages.max(1)).unwrap_or(1)
    }
}

/// Wrap `results` with links built from the current request URL.
///
/// # Errors
/// Errors with `InvalidPage` when the window lies past the last page.
pub fn paginate<T>(
    req: &HttpRequest,
    window: PageWindow,
    count: i64,
    results: Vec<T>,
) -> Result<Paginated<T>, ApiError> {
    let pages = window.page_count(count);
    if window.page > pages {
        return Err(ApiError::InvalidPage);
    }
    let next = (window.page < pages).then(|| page_link(req, window.page + 1));
    let previous = (window.page > 1).then(|| page_link(req, window.page - 1));
    Ok(Paginated {
        count,
        next,
        previous,
        results,
    })
}

/// The current URL with its `page` parameter replaced. Page 1 drops the parameter.
fn page_link(req: &HttpRequest, page: u64) -> String {
    let mut link: Url = req.full_url();
    let retained: Vec<(String, String)> = link
        .query_pairs()
        .filter(|(key, _)| *key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    link.set_query(None);
    if !retained.is_empty() || page > 1 {
        let mut pairs = link.query_pairs_mut();
        pairs.extend_pairs(retained);
        if page > 1 {
            pairs.append_pair("page", &page.to_string());
        }
    }
    link.to_string()
}
