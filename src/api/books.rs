//! Book catalog endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDto, BookQuery},
        loan::LoanDto,
        page::{BookPage, LoanPage, Page, PageQuery, PageRequest},
    },
    AppState,
};

use super::extract::{ApiPath, ApiQuery, ValidatedJson};

async fn load_book(state: &AppState, id: i64) -> AppResult<Book> {
    state
        .services
        .books
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDto),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<BookDto>> {
    let book = load_book(&state, id).await?;
    Ok(Json(book.into()))
}

/// Search books by example
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Page of matching books", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BookQuery>,
) -> AppResult<Json<Page<BookDto>>> {
    let page = state
        .services
        .books
        .find(&query.filter(), query.page_request())
        .await?;
    Ok(Json(page.map(BookDto::from)))
}

/// Register a new book
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    request_body = BookDto,
    responses(
        (status = 201, description = "Book created", body = BookDto),
        (status = 400, description = "Validation failed or isbn already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<BookDto>,
) -> AppResult<(StatusCode, Json<BookDto>)> {
    let book = state.services.books.save(dto.into_book()).await?;
    tracing::info!("Created book {:?} with isbn {}", book.id, book.isbn);
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// Update title and author of a book. The isbn is kept.
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body = BookDto,
    responses(
        (status = 200, description = "Book updated", body = BookDto),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(dto): ValidatedJson<BookDto>,
) -> AppResult<Json<BookDto>> {
    let mut book = load_book(&state, id).await?;
    book.title = dto.title.unwrap_or(book.title);
    book.author = dto.author.unwrap_or(book.author);

    let book = state.services.books.update(book).await?;
    Ok(Json(book.into()))
}

/// Delete a book without loan history
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Book has loans", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    let book = load_book(&state, id).await?;
    state.services.books.delete(&book).await?;
    tracing::info!("Deleted book {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Loan history of a book
#[utoipa::path(
    get,
    path = "/api/books/{id}/loans",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of loans", body = LoanPage),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_loans(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<Page<LoanDto>>> {
    let book = load_book(&state, id).await?;
    let page = state
        .services
        .loans
        .get_loans_by_book(&book, PageRequest::from(query))
        .await?;
    Ok(Json(page.map(LoanDto::from)))
}
