//! Loan management service

use chrono::{Days, Local, NaiveDate};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        loan::{Loan, LoanFilter, BOOK_ALREADY_LOANED},
        page::{Page, PageRequest},
    },
    repository::Repository,
};

/// Days a loan may stay open before it counts as overdue
pub const LOAN_GRACE_DAYS: u64 = 4;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check a book out. Fails when the book is already on an open loan.
    pub async fn save(&self, loan: Loan) -> AppResult<Loan> {
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Loan book id cant be null".to_string()))?;

        if self.repository.loans.exists_active_by_book(book_id).await? {
            return Err(AppError::BusinessRule(BOOK_ALREADY_LOANED.to_string()));
        }
        self.repository.loans.save(Loan { id: None, ..loan }).await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<Loan>> {
        self.repository.loans.find_by_id(id).await
    }

    /// Overwrite a stored loan. No state check: returning a returned loan again is accepted.
    pub async fn update(&self, loan: Loan) -> AppResult<Loan> {
        if loan.id.is_none() {
            return Err(AppError::InvalidArgument("Loan id cant be null".to_string()));
        }
        self.repository.loans.save(loan).await
    }

    pub async fn find(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<Page<Loan>> {
        self.repository.loans.find(filter, page).await
    }

    /// Full loan history of a book
    pub async fn get_loans_by_book(&self, book: &Book, page: PageRequest) -> AppResult<Page<Loan>> {
        let book_id = book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Book id cant be null".to_string()))?;
        self.repository.loans.find_by_book(book_id, page).await
    }

    /// Open loans older than the grace period, as of the local date
    pub async fn get_all_late_loans(&self) -> AppResult<Vec<Loan>> {
        self.late_loans_as_of(Local::now().date_naive()).await
    }

    pub async fn late_loans_as_of(&self, today: NaiveDate) -> AppResult<Vec<Loan>> {
        self.repository.loans.find_late(overdue_cutoff(today)).await
    }
}

/// Loans dated strictly before the returned date are late
pub fn overdue_cutoff(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(LOAN_GRACE_DAYS))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::predicate::eq;

    use super::*;
    use crate::repository::{books::MockBookRepository, loans::MockLoanRepository};

    fn service(loans: MockLoanRepository) -> LoansService {
        LoansService::new(Repository::from_parts(
            Arc::new(MockBookRepository::new()),
            Arc::new(loans),
        ))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book() -> Book {
        Book {
            id: Some(1),
            ..Book::new("As aventuras", "Artur", "123")
        }
    }

    fn open_loan() -> Loan {
        Loan::open(
            book(),
            "Fulano",
            Some("fulano@email.com".into()),
            date(2024, 3, 10),
        )
    }

    #[tokio::test]
    async fn save_assigns_identity_when_book_is_free() {
        let mut loans = MockLoanRepository::new();
        loans
            .expect_exists_active_by_book()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(false));
        loans
            .expect_save()
            .times(1)
            .returning(|loan| Ok(Loan { id: Some(1), ..loan }));

        let saved = service(loans).save(open_loan()).await.unwrap();

        assert_eq!(saved.id, Some(1));
        assert_eq!(saved.returned, None);
        assert_eq!(saved.customer, "Fulano");
    }

    #[tokio::test]
    async fn second_active_loan_is_rejected() {
        let mut loans = MockLoanRepository::new();
        loans.expect_exists_active_by_book().returning(|_| Ok(true));
        loans.expect_save().never();

        let err = service(loans).save(open_loan()).await.unwrap_err();

        assert!(matches!(err, AppError::BusinessRule(msg) if msg == BOOK_ALREADY_LOANED));
    }

    #[tokio::test]
    async fn save_requires_saved_book() {
        let mut loans = MockLoanRepository::new();
        loans.expect_exists_active_by_book().never();

        let loan = Loan {
            book: Book::new("As aventuras", "Artur", "123"),
            ..open_loan()
        };
        let err = service(loans).save(loan).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn update_does_not_check_previous_state() {
        let mut loans = MockLoanRepository::new();
        loans.expect_exists_active_by_book().never();
        loans
            .expect_save()
            .withf(|loan| loan.id == Some(5) && loan.returned == Some(true))
            .times(1)
            .returning(|loan| Ok(loan));

        let returned_twice = Loan {
            id: Some(5),
            returned: Some(true),
            ..open_loan()
        };
        let updated = service(loans).update(returned_twice).await.unwrap();

        assert_eq!(updated.returned, Some(true));
    }

    #[tokio::test]
    async fn loans_by_book_use_book_identity() {
        let mut loans = MockLoanRepository::new();
        loans
            .expect_find_by_book()
            .withf(|book_id, page| *book_id == 1 && page.page == 0)
            .times(1)
            .returning(|_, page| Ok(Page::new(vec![open_loan()], page, 1)));

        let page = service(loans)
            .get_loans_by_book(&book(), PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total_elements, 1);
    }

    #[test]
    fn cutoff_is_four_days_back() {
        assert_eq!(overdue_cutoff(date(2024, 3, 10)), date(2024, 3, 6));
        assert_eq!(overdue_cutoff(date(2024, 3, 2)), date(2024, 2, 27));
    }

    #[tokio::test]
    async fn late_loans_query_uses_cutoff() {
        let mut loans = MockLoanRepository::new();
        loans
            .expect_find_late()
            .with(eq(date(2024, 3, 6)))
            .times(1)
            .returning(|_| Ok(vec![]));

        let late = service(loans)
            .late_loans_as_of(date(2024, 3, 10))
            .await
            .unwrap();

        assert!(late.is_empty());
    }

    #[test]
    fn loan_dated_exactly_at_cutoff_is_not_late() {
        let today = date(2024, 3, 10);
        let cutoff = overdue_cutoff(today);

        let at_cutoff = Loan::open(book(), "Fulano", None, date(2024, 3, 6));
        let before_cutoff = Loan::open(book(), "Fulano", None, date(2024, 3, 5));

        assert!(!at_cutoff.is_late(cutoff));
        assert!(before_cutoff.is_late(cutoff));
    }
}
