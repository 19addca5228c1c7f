//! Page arithmetic and the paged response envelope used by list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::errors::{ApiError, ApiResult};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw `?page=&page_size=` query parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page number, starting at 1
    pub page: Option<i64>,
    /// Items per page, between 1 and 100
    pub page_size: Option<i64>,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> ApiResult<Self> {
        if page < 1 {
            return Err(ApiError::validation("Invalid page number"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ApiError::validation("Invalid page size"));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Saturates for pages far past the end; such a page is simply empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

impl TryFrom<PaginationQuery> for PageRequest {
    type Error = ApiError;

    fn try_from(query: PaginationQuery) -> ApiResult<Self> {
        PageRequest::new(
            query.page.unwrap_or(DEFAULT_PAGE),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

pub fn total_pages(total_items: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 0;
    }
    (total_items + page_size - 1) / page_size
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub first: String,
    pub last: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

impl PageLinks {
    /// `base` is the absolute URL of the collection without a query string.
    pub fn build(base: &str, request: PageRequest, total_pages: i64) -> Self {
        let link = |page: i64| format!("{}?page={}&page_size={}", base, page, request.page_size);
        let page = request.page;

        PageLinks {
            self_link: link(page),
            first: link(1),
            last: link(total_pages.max(1)),
            next: (page < total_pages).then(|| link(page + 1)),
            prev: (page > 1).then(|| link(page - 1)),
        }
    }
}

/// List envelope: `{"data": [...], "meta": {...}, "links": {...}}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PagedResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<PageLinks>,
}

impl<T> PagedResponse<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total_items: i64) -> Self {
        let meta = PageMeta {
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: total_pages(total_items, request.page_size),
        };
        Self { data, meta, links: None }
    }

    pub fn with_links(mut self, base: &str) -> Self {
        let request = PageRequest {
            page: self.meta.page,
            page_size: self.meta.page_size,
        };
        self.links = Some(PageLinks::build(base, request, self.meta.total_pages));
        self
    }
}
