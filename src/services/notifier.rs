//! Scheduled overdue-loan reminders.
//!
//! ```text
//! Scheduler (notifications.cron)
//!     │
//!     └─► LoansService::get_all_late_loans()
//!             └─► collect customer emails → Mailer::send_mails (one batch)
//! ```

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::{email::Mailer, loans::LoansService};
use crate::{config::NotificationsConfig, error::AppResult};

pub const OVERDUE_SUBJECT: &str = "Book loan overdue";

#[derive(Clone)]
pub struct OverdueNotifier {
    loans: LoansService,
    mailer: Arc<dyn Mailer>,
    message: String,
}

impl OverdueNotifier {
    pub fn new(loans: LoansService, mailer: Arc<dyn Mailer>, message: impl Into<String>) -> Self {
        Self {
            loans,
            mailer,
            message: message.into(),
        }
    }

    /// Send one reminder batch. Returns the number of recipients.
    pub async fn run_once(&self) -> AppResult<usize> {
        let late = self.loans.get_all_late_loans().await?;
        let recipients: Vec<String> = late
            .into_iter()
            .filter_map(|loan| loan.customer_email)
            .filter(|email| !email.trim().is_empty())
            .collect();

        if recipients.is_empty() {
            tracing::info!("No overdue loans with a contact address");
            return Ok(0);
        }

        tracing::info!("Notifying {} overdue loan(s)", recipients.len());
        self.mailer
            .send_mails(OVERDUE_SUBJECT, &self.message, &recipients)
            .await?;

        Ok(recipients.len())
    }
}

/// Start the reminder job on `config.cron`. Returns `None` when notifications are disabled.
pub async fn start_scheduler(
    notifier: OverdueNotifier,
    config: &NotificationsConfig,
) -> Result<Option<JobScheduler>> {
    if !config.enabled {
        tracing::info!("Overdue notifications disabled");
        return Ok(None);
    }

    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(config.cron.as_str(), move |_uuid, _lock| {
        let notifier = notifier.clone();
        Box::pin(async move {
            if let Err(e) = notifier.run_once().await {
                tracing::error!("Overdue notification task failed: {}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!("Overdue notifications scheduled ({})", config.cron);
    Ok(Some(scheduler))
}

#[cfg(test)]
mod tests {
    use chrono::{Days, Local};

    use super::*;
    use crate::{
        error::AppError,
        models::{book::Book, loan::Loan},
        repository::{books::MockBookRepository, loans::MockLoanRepository, Repository},
        services::email::MockMailer,
    };

    fn late_loan(email: Option<&str>) -> Loan {
        let book = Book {
            id: Some(1),
            ..Book::new("As aventuras", "Artur", "123")
        };
        let date = Local::now().date_naive() - Days::new(10);
        Loan::open(book, "Fulano", email.map(str::to_string), date)
    }

    fn notifier(loans: MockLoanRepository, mailer: MockMailer) -> OverdueNotifier {
        let repository =
            Repository::from_parts(Arc::new(MockBookRepository::new()), Arc::new(loans));
        OverdueNotifier::new(LoansService::new(repository), Arc::new(mailer), "Return it")
    }

    #[tokio::test]
    async fn sends_one_batch_to_every_late_customer() {
        let mut loans = MockLoanRepository::new();
        loans.expect_find_late().times(1).returning(|_| {
            Ok(vec![
                late_loan(Some("a@example.org")),
                late_loan(None),
                late_loan(Some("b@example.org")),
            ])
        });

        let mut mailer = MockMailer::new();
        mailer
            .expect_send_mails()
            .withf(|subject, body, recipients| {
                subject == OVERDUE_SUBJECT
                    && body == "Return it"
                    && recipients == ["a@example.org".to_string(), "b@example.org".to_string()]
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let sent = notifier(loans, mailer).run_once().await.unwrap();
        assert_eq!(sent, 2);
    }

    #[tokio::test]
    async fn nothing_is_sent_without_recipients() {
        let mut loans = MockLoanRepository::new();
        loans.expect_find_late().returning(|_| Ok(vec![late_loan(None)]));

        let mut mailer = MockMailer::new();
        mailer.expect_send_mails().never();

        assert_eq!(notifier(loans, mailer).run_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn transport_failure_fails_the_batch() {
        let mut loans = MockLoanRepository::new();
        loans
            .expect_find_late()
            .returning(|_| Ok(vec![late_loan(Some("a@example.org"))]));

        let mut mailer = MockMailer::new();
        mailer
            .expect_send_mails()
            .times(1)
            .returning(|_, _, _| Err(AppError::Mail("connection refused".into())));

        let err = notifier(loans, mailer).run_once().await.unwrap_err();
        assert!(matches!(err, AppError::Mail(_)));
    }

    #[tokio::test]
    async fn disabled_notifications_start_no_scheduler() {
        let config = NotificationsConfig {
            enabled: false,
            ..Default::default()
        };
        let scheduler = start_scheduler(
            notifier(MockLoanRepository::new(), MockMailer::new()),
            &config,
        )
        .await
        .unwrap();

        assert!(scheduler.is_none());
    }
}
