//! Loans repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        loan::{Loan, LoanFilter, BOOK_ALREADY_LOANED, BOOK_NOT_FOUND_FOR_ISBN},
        page::{Page, PageRequest},
    },
};

const ACTIVE_LOAN_CONSTRAINT: &str = "loans_one_active_per_book";

const LOAN_SELECT: &str = r#"
    SELECT l.id, l.customer, l.customer_email, l.loan_date, l.returned,
           b.id AS book_id, b.title, b.author, b.isbn
    FROM loans l
    JOIN books b ON b.id = l.book_id
"#;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Loan>>;

    /// True when the book has a loan whose `returned` flag is not `true`
    async fn exists_active_by_book(&self, book_id: i64) -> AppResult<bool>;

    /// Loans whose book isbn matches OR whose customer matches.
    /// With both criteria absent every loan is returned.
    async fn find(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<Page<Loan>>;

    async fn find_by_book(&self, book_id: i64, page: PageRequest) -> AppResult<Page<Loan>>;

    /// Insert when `loan.id` is `None`, otherwise overwrite the stored row
    async fn save(&self, loan: Loan) -> AppResult<Loan>;

    /// Open loans that started strictly before `cutoff`
    async fn find_late(&self, cutoff: NaiveDate) -> AppResult<Vec<Loan>>;
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_page(
        &self,
        where_clause: &str,
        binds: &[BindValue<'_>],
        page: PageRequest,
    ) -> AppResult<Page<Loan>> {
        let count_q = format!(
            "SELECT COUNT(*) FROM loans l JOIN books b ON b.id = l.book_id {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        for value in binds {
            count_builder = match value {
                BindValue::Id(v) => count_builder.bind(*v),
                BindValue::Text(v) => count_builder.bind(*v),
            };
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "{} {} ORDER BY l.id LIMIT {} OFFSET {}",
            LOAN_SELECT,
            where_clause,
            page.size,
            page.offset()
        );
        let mut builder = sqlx::query(&select_q);
        for value in binds {
            builder = match value {
                BindValue::Id(v) => builder.bind(*v),
                BindValue::Text(v) => builder.bind(*v),
            };
        }
        let rows = builder.fetch_all(&self.pool).await?;
        let loans = rows.iter().map(loan_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(loans, page, total))
    }
}

enum BindValue<'a> {
    Id(i64),
    Text(&'a str),
}

fn loan_from_row(row: &PgRow) -> Result<Loan, sqlx::Error> {
    Ok(Loan {
        id: row.try_get("id")?,
        book: Book {
            id: row.try_get("book_id")?,
            title: row.try_get("title")?,
            author: row.try_get("author")?,
            isbn: row.try_get("isbn")?,
        },
        customer: row.try_get("customer")?,
        customer_email: row.try_get("customer_email")?,
        loan_date: row.try_get("loan_date")?,
        returned: row.try_get("returned")?,
    })
}

fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.constraint() == Some(ACTIVE_LOAN_CONSTRAINT) {
            return AppError::BusinessRule(BOOK_ALREADY_LOANED.to_string());
        }
        if db.is_foreign_key_violation() {
            return AppError::BusinessRule(BOOK_NOT_FOUND_FOR_ISBN.to_string());
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl LoanRepository for LoansRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Loan>> {
        let row = sqlx::query(&format!("{} WHERE l.id = $1", LOAN_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(loan_from_row).transpose()?)
    }

    async fn exists_active_by_book(&self, book_id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1 AND returned IS NOT TRUE)",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<Page<Loan>> {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();

        if let Some(ref isbn) = filter.isbn {
            binds.push(BindValue::Text(isbn));
            conditions.push(format!("b.isbn = ${}", binds.len()));
        }
        if let Some(ref customer) = filter.customer {
            binds.push(BindValue::Text(customer));
            conditions.push(format!("l.customer = ${}", binds.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" OR "))
        };

        self.fetch_page(&where_clause, &binds, page).await
    }

    async fn find_by_book(&self, book_id: i64, page: PageRequest) -> AppResult<Page<Loan>> {
        self.fetch_page("WHERE l.book_id = $1", &[BindValue::Id(book_id)], page)
            .await
    }

    async fn save(&self, loan: Loan) -> AppResult<Loan> {
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Loan book has no id".to_string()))?;

        let id: Option<i64> = match loan.id {
            Some(id) => sqlx::query_scalar::<_, i64>(
                r#"
                UPDATE loans
                SET book_id = $1, customer = $2, customer_email = $3, loan_date = $4, returned = $5
                WHERE id = $6
                RETURNING id
                "#,
            )
            .bind(book_id)
            .bind(&loan.customer)
            .bind(&loan.customer_email)
            .bind(loan.loan_date)
            .bind(loan.returned)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?,
            None => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO loans (book_id, customer, customer_email, loan_date, returned)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(book_id)
            .bind(&loan.customer)
            .bind(&loan.customer_email)
            .bind(loan.loan_date)
            .bind(loan.returned)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?,
        };

        match id {
            Some(id) => Ok(Loan {
                id: Some(id),
                ..loan
            }),
            None => Err(AppError::NotFound(format!(
                "Loan {} not found",
                loan.id.unwrap_or_default()
            ))),
        }
    }

    async fn find_late(&self, cutoff: NaiveDate) -> AppResult<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.loan_date < $1 AND l.returned IS NOT TRUE ORDER BY l.loan_date, l.id",
            LOAN_SELECT
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        let loans = rows.iter().map(loan_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(loans)
    }
}
