//! Repository layer for database operations

pub mod books;
pub mod loans;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use books::BookRepository;
pub use loans::LoanRepository;

/// Main repository struct holding the store handles
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookRepository>,
    pub loans: Arc<dyn LoanRepository>,
}

impl Repository {
    /// Create PostgreSQL-backed repositories sharing the given pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            loans: Arc::new(loans::LoansRepository::new(pool)),
        }
    }

    /// Assemble from existing handles (in-memory or mocked stores)
    pub fn from_parts(books: Arc<dyn BookRepository>, loans: Arc<dyn LoanRepository>) -> Self {
        Self { books, loans }
    }
}
