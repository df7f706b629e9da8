//! Books repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFilter, BOOK_HAS_LOANS, DUPLICATE_ISBN},
        page::{Page, PageRequest},
    },
};

const ISBN_UNIQUE_CONSTRAINT: &str = "books_isbn_key";

/// Persistence of book records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool>;

    /// By-example search, see [`BookFilter`]
    async fn find_all(&self, filter: &BookFilter, page: PageRequest) -> AppResult<Page<Book>>;

    /// Insert when `book.id` is `None`, otherwise overwrite the stored row
    async fn save(&self, book: Book) -> AppResult<Book>;

    async fn delete(&self, id: i64) -> AppResult<()>;
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards and turn `value` into a lower-cased prefix pattern
pub(crate) fn prefix_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 1);
    for c in value.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.constraint() == Some(ISBN_UNIQUE_CONSTRAINT) {
            return AppError::BusinessRule(DUPLICATE_ISBN.to_string());
        }
        if db.is_foreign_key_violation() {
            return AppError::BusinessRule(BOOK_HAS_LOANS.to_string());
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl BookRepository for BooksRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT id, title, author, isbn FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book =
            sqlx::query_as::<_, Book>("SELECT id, title, author, isbn FROM books WHERE isbn = $1")
                .bind(isbn)
                .fetch_optional(&self.pool)
                .await?;
        Ok(book)
    }

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_all(&self, filter: &BookFilter, page: PageRequest) -> AppResult<Page<Book>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if filter.id.is_some() {
            conditions.push(format!("id = ${}", idx));
            idx += 1;
        }
        if filter.title.is_some() {
            conditions.push(format!("LOWER(title) LIKE ${} ESCAPE '\\'", idx));
            idx += 1;
        }
        if filter.author.is_some() {
            conditions.push(format!("LOWER(author) LIKE ${} ESCAPE '\\'", idx));
            idx += 1;
        }
        if filter.isbn.is_some() {
            conditions.push(format!("LOWER(isbn) LIKE ${} ESCAPE '\\'", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let title = filter.title.as_deref().map(prefix_pattern);
        let author = filter.author.as_deref().map(prefix_pattern);
        let isbn = filter.isbn.as_deref().map(prefix_pattern);

        // Count total
        let count_q = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(id) = filter.id { count_builder = count_builder.bind(id); }
        if let Some(ref t) = title { count_builder = count_builder.bind(t); }
        if let Some(ref a) = author { count_builder = count_builder.bind(a); }
        if let Some(ref i) = isbn { count_builder = count_builder.bind(i); }
        let total = count_builder.fetch_one(&self.pool).await?;

        // Fetch rows
        let select_q = format!(
            "SELECT id, title, author, isbn FROM books {} ORDER BY id LIMIT {} OFFSET {}",
            where_clause,
            page.size,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, Book>(&select_q);
        if let Some(id) = filter.id { builder = builder.bind(id); }
        if let Some(ref t) = title { builder = builder.bind(t); }
        if let Some(ref a) = author { builder = builder.bind(a); }
        if let Some(ref i) = isbn { builder = builder.bind(i); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(Page::new(rows, page, total))
    }

    async fn save(&self, book: Book) -> AppResult<Book> {
        match book.id {
            Some(id) => sqlx::query_as::<_, Book>(
                r#"
                UPDATE books SET title = $1, author = $2, isbn = $3
                WHERE id = $4
                RETURNING id, title, author, isbn
                "#,
            )
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id))),
            None => sqlx::query_as::<_, Book>(
                r#"
                INSERT INTO books (title, author, isbn)
                VALUES ($1, $2, $3)
                RETURNING id, title, author, isbn
                "#,
            )
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pattern_lowercases_and_appends_wildcard() {
        assert_eq!(prefix_pattern("As Aventuras"), "as aventuras%");
    }

    #[test]
    fn prefix_pattern_escapes_wildcards() {
        assert_eq!(prefix_pattern("50%_off\\"), "50\\%\\_off\\\\%");
    }
}
