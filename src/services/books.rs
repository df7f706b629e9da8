//! Book catalog service

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFilter, DUPLICATE_ISBN},
        page::{Page, PageRequest},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a new book. The isbn must not be registered yet.
    pub async fn save(&self, book: Book) -> AppResult<Book> {
        if self.repository.books.exists_by_isbn(&book.isbn).await? {
            return Err(AppError::BusinessRule(DUPLICATE_ISBN.to_string()));
        }
        self.repository.books.save(Book { id: None, ..book }).await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        self.repository.books.find_by_id(id).await
    }

    /// Overwrite a stored book
    pub async fn update(&self, book: Book) -> AppResult<Book> {
        if book.id.is_none() {
            return Err(AppError::InvalidArgument("Book id cant be null".to_string()));
        }
        self.repository.books.save(book).await
    }

    pub async fn delete(&self, book: &Book) -> AppResult<()> {
        let id = book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Book id cant be null".to_string()))?;
        self.repository.books.delete(id).await
    }

    pub async fn find(&self, filter: &BookFilter, page: PageRequest) -> AppResult<Page<Book>> {
        self.repository.books.find_all(filter, page).await
    }

    pub async fn get_book_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        self.repository.books.find_by_isbn(isbn).await
    }
}
