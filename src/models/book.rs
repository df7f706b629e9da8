//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::page::PageRequest;

pub const DUPLICATE_ISBN: &str = "Isbn already registered";
pub const BOOK_HAS_LOANS: &str = "Book has loans and cannot be deleted";

/// Book record. `id` is `None` until the book has been saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl Book {
    pub fn new(title: impl Into<String>, author: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
        }
    }
}

/// By-example book filter. `None` fields are unconstrained; string fields match
/// case-insensitively on prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

impl BookFilter {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.title.is_none() && self.author.is_none() && self.isbn.is_none()
    }
}

/// Book representation on the wire, validated on create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookDto {
    pub id: Option<i64>,
    #[validate(
        required(message = "Title is required"),
        length(min = 1, message = "Title must not be empty")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "Author is required"),
        length(min = 1, message = "Author must not be empty")
    )]
    pub author: Option<String>,
    #[validate(
        required(message = "Isbn is required"),
        length(min = 1, message = "Isbn must not be empty")
    )]
    pub isbn: Option<String>,
}

impl BookDto {
    /// Convert a validated request body into a new, unsaved book
    pub fn into_book(self) -> Book {
        Book {
            id: None,
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            isbn: self.isbn.unwrap_or_default(),
        }
    }
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: Some(book.title),
            author: Some(book.author),
            isbn: Some(book.isbn),
        }
    }
}

/// Query parameters for GET /books
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Exact book id
    pub id: Option<i64>,
    /// Title prefix (case-insensitive)
    pub title: Option<String>,
    /// Author prefix (case-insensitive)
    pub author: Option<String>,
    /// ISBN prefix (case-insensitive)
    pub isbn: Option<String>,
    /// Page number (0-based)
    pub page: Option<i64>,
    /// Page size (default: 20)
    pub size: Option<i64>,
}

impl BookQuery {
    pub fn filter(&self) -> BookFilter {
        BookFilter {
            id: self.id,
            title: non_blank(&self.title),
            author: non_blank(&self.author),
            isbn: non_blank(&self.isbn),
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }
}

/// Empty query values (`?title=`) are treated as absent
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
