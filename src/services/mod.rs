//! Business logic services

pub mod books;
pub mod email;
pub mod loans;
pub mod notifier;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub loans: loans::LoansService,
    pub notifier: notifier::OverdueNotifier,
}

impl Services {
    /// Create all services with the given repository, sending mail over SMTP
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let mailer: Arc<dyn email::Mailer> = Arc::new(email::SmtpMailer::new(config.email.clone()));
        Self::with_mailer(repository, mailer, config)
    }

    pub fn with_mailer(
        repository: Repository,
        mailer: Arc<dyn email::Mailer>,
        config: &AppConfig,
    ) -> Self {
        let loans = loans::LoansService::new(repository.clone());
        let notifier = notifier::OverdueNotifier::new(
            loans.clone(),
            mailer,
            config.notifications.message.clone(),
        );

        Self {
            books: books::BooksService::new(repository),
            loans,
            notifier,
        }
    }
}
