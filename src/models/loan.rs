//! Loan (check-out) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::{non_blank, Book, BookDto};
use super::page::PageRequest;

pub const BOOK_ALREADY_LOANED: &str = "Book already loaned";
pub const BOOK_NOT_FOUND_FOR_ISBN: &str = "Book not found for passed isbn";

/// Loan of one book to one customer.
///
/// `returned` is tri-state: `None` and `Some(false)` both mean the loan is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Loan {
    pub id: Option<i64>,
    pub book: Book,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
    pub returned: Option<bool>,
}

impl Loan {
    /// A new, unsaved loan starting on `loan_date`
    pub fn open(
        book: Book,
        customer: impl Into<String>,
        customer_email: Option<String>,
        loan_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            book,
            customer: customer.into(),
            customer_email,
            loan_date,
            returned: None,
        }
    }

    /// Open loans block further check-outs of the same book
    pub fn is_active(&self) -> bool {
        self.returned != Some(true)
    }

    /// Still open and started strictly before `cutoff`
    pub fn is_late(&self, cutoff: NaiveDate) -> bool {
        self.is_active() && self.loan_date < cutoff
    }
}

/// Loan search filter. A loan matches when its book isbn equals `isbn`
/// OR its customer equals `customer`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanFilter {
    pub isbn: Option<String>,
    pub customer: Option<String>,
}

/// Query parameters for GET /loans
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    /// Book ISBN
    pub isbn: Option<String>,
    /// Customer name
    pub customer: Option<String>,
    /// Page number (0-based)
    pub page: Option<i64>,
    /// Page size (default: 20)
    pub size: Option<i64>,
}

impl LoanQuery {
    pub fn filter(&self) -> LoanFilter {
        LoanFilter {
            isbn: non_blank(&self.isbn),
            customer: non_blank(&self.customer),
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }
}

/// Check-out request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLoanRequest {
    #[validate(
        required(message = "Isbn is required"),
        length(min = 1, message = "Isbn must not be empty")
    )]
    pub isbn: Option<String>,
    #[validate(
        required(message = "Customer is required"),
        length(min = 1, message = "Customer must not be empty")
    )]
    pub customer: Option<String>,
    /// Address used for overdue reminders
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Return request: `{ "returned": true }`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReturnLoanRequest {
    pub returned: bool,
}

/// Loan representation on the wire
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanDto {
    pub id: Option<i64>,
    pub isbn: String,
    pub customer: String,
    pub email: Option<String>,
    pub loan_date: NaiveDate,
    pub returned: Option<bool>,
    pub book: BookDto,
}

impl From<Loan> for LoanDto {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.id,
            isbn: loan.book.isbn.clone(),
            customer: loan.customer,
            email: loan.customer_email,
            loan_date: loan.loan_date,
            returned: loan.returned,
            book: BookDto::from(loan.book),
        }
    }
}
