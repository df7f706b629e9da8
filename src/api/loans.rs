//! Loan management endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Local;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{CreateLoanRequest, Loan, LoanDto, LoanQuery, ReturnLoanRequest, BOOK_NOT_FOUND_FOR_ISBN},
        page::{LoanPage, Page},
    },
    AppState,
};

use super::extract::{ApiPath, ApiQuery, ValidatedJson};

/// Check a book out to a customer
#[utoipa::path(
    post,
    path = "/api/loans",
    tag = "loans",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created, body is the loan id", body = i64),
        (status = 400, description = "Book not found for isbn or already loaned", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<i64>)> {
    let isbn = request.isbn.unwrap_or_default();
    let book = state
        .services
        .books
        .get_book_by_isbn(&isbn)
        .await?
        .ok_or_else(|| AppError::BadRequest(BOOK_NOT_FOUND_FOR_ISBN.to_string()))?;

    let loan = Loan::open(
        book,
        request.customer.unwrap_or_default(),
        request.email,
        Local::now().date_naive(),
    );
    let loan = state.services.loans.save(loan).await?;

    let id = loan
        .id
        .ok_or_else(|| AppError::Internal("Saved loan has no id".to_string()))?;
    tracing::info!("Loan {} created for isbn {}", id, isbn);

    Ok((StatusCode::CREATED, Json(id)))
}

/// Mark a loan as returned
#[utoipa::path(
    patch,
    path = "/api/loans/{id}",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    request_body = ReturnLoanRequest,
    responses(
        (status = 200, description = "Loan updated", body = LoanDto),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(request): ValidatedJson<ReturnLoanRequest>,
) -> AppResult<Json<LoanDto>> {
    let mut loan = state
        .services
        .loans
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))?;

    loan.returned = Some(request.returned);
    let loan = state.services.loans.update(loan).await?;
    tracing::info!("Loan {} returned={}", id, request.returned);

    Ok(Json(loan.into()))
}

/// Search loans by isbn or customer
#[utoipa::path(
    get,
    path = "/api/loans",
    tag = "loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "Page of matching loans", body = LoanPage)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LoanQuery>,
) -> AppResult<Json<Page<LoanDto>>> {
    let page = state
        .services
        .loans
        .find(&query.filter(), query.page_request())
        .await?;
    Ok(Json(page.map(LoanDto::from)))
}
