//! Paging request and page envelope

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::book::BookDto;
use super::loan::LoanDto;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 2000;
/// Highest page number whose offset still fits in an `i64` at any page size
pub const MAX_PAGE_NUMBER: i64 = i64::MAX / MAX_PAGE_SIZE - 1;

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    /// Build a request from optional query values, clamping out-of-range input
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(0).clamp(0, MAX_PAGE_NUMBER),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn of(page: i64, size: i64) -> Self {
        Self::new(Some(page), Some(size))
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Bare paging query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (0-based)
    pub page: Option<i64>,
    /// Page size (default: 20)
    pub size: Option<i64>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        Self::new(query.page, query.size)
    }
}

/// Echo of the page request in a response
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub page_number: i64,
    pub page_size: i64,
    pub offset: i64,
}

impl From<PageRequest> for Pageable {
    fn from(request: PageRequest) -> Self {
        Self {
            page_number: request.page,
            page_size: request.size,
            offset: request.offset(),
        }
    }
}

/// A slice of results plus the total count
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(BookPage = Page<BookDto>, LoanPage = Page<LoanDto>)]
pub struct Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub content: Vec<T>,
    pub pageable: Pageable,
    pub total_elements: i64,
    pub total_pages: i64,
    pub number: i64,
    pub size: i64,
    pub number_of_elements: i64,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements.saturating_add(request.size - 1)) / request.size
        };
        let number_of_elements = content.len() as i64;

        Self {
            empty: content.is_empty(),
            content,
            pageable: request.into(),
            total_elements,
            total_pages,
            number: request.page,
            size: request.size,
            number_of_elements,
            first: request.page == 0,
            last: request.page.saturating_add(1) >= total_pages,
        }
    }

    /// Convert the content while keeping the paging metadata
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        U: for<'a> ToSchema<'a>,
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            pageable: self.pageable,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number: self.number,
            size: self.size,
            number_of_elements: self.number_of_elements,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }
}
