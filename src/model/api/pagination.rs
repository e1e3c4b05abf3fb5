use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 50;

/// A validated pagination request, read from the `page` and `page_size`
/// query parameters. `page` is 1-based; `page_size` is clamped to
/// `[1, MAX_PAGE_SIZE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationRequest {
    page: usize,
    page_size: usize,
}

impl PaginationRequest {
    /// Build a request from raw parameters, clamping them into range.
    pub fn clamped(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// How many matching records precede this page. Saturates rather than
    /// overflowing for absurdly large page numbers.
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size) as u64
    }

    /// The find limit for this page.
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    /// Wrap one page of items together with the total match count.
    pub fn to_paginated<T>(self, total: u64, items: Vec<T>) -> Paginated<T> {
        Paginated {
            items,
            total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self::clamped(1, DEFAULT_PAGE_SIZE)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PaginationRequest {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let page = if let Ok(page) = req.query_value::<usize>("page").unwrap_or(Ok(1)) {
            page
        } else {
            return request::Outcome::Failure((Status::BadRequest, ()));
        };
        let page_size = if let Ok(page_size) = req
            .query_value::<usize>("page_size")
            .unwrap_or(Ok(DEFAULT_PAGE_SIZE))
        {
            page_size
        } else {
            return request::Outcome::Failure((Status::BadRequest, ()));
        };
        request::Outcome::Success(Self::clamped(page, page_size))
    }
}

/// One page of results, plus the pagination echo and total match count.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping() {
        assert_eq!(
            PaginationRequest::clamped(0, 0),
            PaginationRequest {
                page: 1,
                page_size: 1
            }
        );
        assert_eq!(
            PaginationRequest::clamped(3, 500),
            PaginationRequest {
                page: 3,
                page_size: MAX_PAGE_SIZE
            }
        );
        assert_eq!(
            PaginationRequest::default(),
            PaginationRequest {
                page: 1,
                page_size: DEFAULT_PAGE_SIZE
            }
        );
    }

    #[test]
    fn skip_and_limit() {
        let pagination = PaginationRequest::clamped(1, 10);
        assert_eq!(pagination.skip(), 0);
        assert_eq!(pagination.limit(), 10);

        let pagination = PaginationRequest::clamped(4, 25);
        assert_eq!(pagination.skip(), 75);
        assert_eq!(pagination.limit(), 25);
    }

    #[test]
    fn skip_saturates_for_huge_pages() {
        let pagination = PaginationRequest::clamped(usize::MAX, MAX_PAGE_SIZE);
        assert_eq!(pagination.skip(), usize::MAX as u64);
    }

    #[test]
    fn pages_cover_the_result_set() {
        // 23 matches at page size 10 means 3 pages: 10 + 10 + 3.
        let total: usize = 23;
        let page_size = 10;
        let pages = (total + page_size - 1) / page_size;
        assert_eq!(pages, 3);

        let mut seen = 0;
        for page in 1..=pages {
            let pagination = PaginationRequest::clamped(page, page_size);
            let on_page = total.saturating_sub(pagination.skip() as usize).min(page_size);
            assert!(on_page <= pagination.page_size());
            seen += on_page;
        }
        assert_eq!(seen, total);
    }
}
