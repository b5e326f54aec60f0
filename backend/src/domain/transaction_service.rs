//! Transaction ledger: creates lending agreements and drives their lifecycle.
//!
//! Allowed status changes come from [`TransactionStatus::allowed_transitions`].
//! Only the owner may start (`active`) or close (`completed`) a transaction;
//! either party may cancel or flag it overdue.
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::domain::{
    commands::transactions::{
        CreateTransactionCommand, TransactionDetails, TransactionListQuery,
        UpdateTransactionStatusCommand,
    },
    error::{DomainError, DomainResult},
    models::{
        book::Book,
        transaction::{Transaction, TransactionStatus, TransactionType},
    },
    trust_service::TrustService,
};
use crate::storage::{BookStorage, Connection, PartySide, TransactionStorage, UserStorage};

fn validate_money(value: Option<f64>, field: &str) -> DomainResult<f64> {
    let value = value.unwrap_or(0.0);
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(format!(
            "{} must be a non-negative amount",
            field
        )));
    }
    Ok(value)
}

#[derive(Clone)]
pub struct TransactionService<C: Connection> {
    transaction_repository: C::TransactionRepository,
    book_repository: C::BookRepository,
    user_repository: C::UserRepository,
    trust_service: TrustService<C>,
}

impl<C: Connection> TransactionService<C> {
    pub fn new(connection: Arc<C>, trust_service: TrustService<C>) -> Self {
        Self {
            transaction_repository: connection.create_transaction_repository(),
            book_repository: connection.create_book_repository(),
            user_repository: connection.create_user_repository(),
            trust_service,
        }
    }

    pub async fn create_transaction(
        &self,
        command: CreateTransactionCommand,
    ) -> DomainResult<Transaction> {
        let transaction_type: TransactionType = command.transaction_type.parse()?;
        let security_deposit = validate_money(command.security_deposit, "Security deposit")?;
        let rental_fee = validate_money(command.rental_fee, "Rental fee")?;

        let book = self.require_book(&command.book_id).await?;
        if book.owner_id != command.owner_id {
            return Err(DomainError::validation(
                "owner_id does not match the book's owner",
            ));
        }
        if command.owner_id == command.requester_id {
            return Err(DomainError::conflict(
                "You cannot request your own book",
            ));
        }
        if self
            .transaction_repository
            .find_open_for_book(&book.id)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(
                "Book already has a pending or active transaction",
            ));
        }

        let now = Utc::now();
        let transaction = Transaction {
            id: Transaction::generate_id(),
            book_id: book.id.clone(),
            owner_id: command.owner_id,
            requester_id: command.requester_id,
            transaction_type,
            status: TransactionStatus::Pending,
            start_date: None,
            expected_return_date: command.expected_return_date,
            actual_return_date: None,
            security_deposit,
            rental_fee,
            notes: command.notes,
            created_at: now,
            updated_at: now,
        };

        // A concurrent request that passed the check above still hits the unique index
        self.transaction_repository
            .store_transaction(&transaction)
            .await?;

        info!(
            "Created {} transaction {} for book '{}'",
            transaction.transaction_type, transaction.id, book.title
        );
        Ok(transaction)
    }

    pub async fn update_status(
        &self,
        command: UpdateTransactionStatusCommand,
    ) -> DomainResult<Transaction> {
        let mut transaction = self.require_transaction(&command.transaction_id).await?;

        if !transaction.is_party(&command.actor_id) {
            return Err(DomainError::permission(
                "You are not a party to this transaction",
            ));
        }

        let new_status: TransactionStatus = command.new_status.parse()?;
        let previous = transaction.status;
        if !previous.can_transition_to(new_status) {
            return Err(DomainError::validation(format!(
                "Cannot transition from {} to {}",
                previous, new_status
            )));
        }

        let owner_only = matches!(
            new_status,
            TransactionStatus::Active | TransactionStatus::Completed
        );
        if owner_only && command.actor_id != transaction.owner_id {
            return Err(DomainError::permission(format!(
                "Only the owner can mark a transaction {}",
                new_status
            )));
        }

        let now = Utc::now();
        match new_status {
            TransactionStatus::Active => transaction.start_date = Some(now),
            TransactionStatus::Completed => {
                transaction.actual_return_date = Some(command.actual_return_date.unwrap_or(now))
            }
            TransactionStatus::Pending
            | TransactionStatus::Overdue
            | TransactionStatus::Cancelled => {}
        }
        if command.notes.is_some() {
            transaction.notes = command.notes;
        }
        transaction.status = new_status;
        transaction.updated_at = now;

        let applied = self
            .transaction_repository
            .update_transaction(&transaction, previous)
            .await?;
        if !applied {
            return Err(DomainError::conflict(
                "Transaction was modified concurrently, reload and retry",
            ));
        }

        info!(
            "Transaction {} moved {} -> {} by {}",
            transaction.id, previous, new_status, command.actor_id
        );

        if new_status == TransactionStatus::Completed {
            self.trust_service
                .recompute_after_change(&transaction.owner_id)
                .await;
            self.trust_service
                .recompute_after_change(&transaction.requester_id)
                .await;
        }

        Ok(transaction)
    }

    /// One transaction, visible to its parties only
    pub async fn get_transaction(
        &self,
        actor_id: &str,
        transaction_id: &str,
    ) -> DomainResult<TransactionDetails> {
        let transaction = self.require_transaction(transaction_id).await?;
        if !transaction.is_party(actor_id) {
            return Err(DomainError::permission(
                "You are not a party to this transaction",
            ));
        }
        self.details(transaction).await
    }

    /// Every transaction `user_id` is a party to, newest first
    pub async fn list_transactions(
        &self,
        user_id: &str,
        query: TransactionListQuery,
    ) -> DomainResult<Vec<TransactionDetails>> {
        let status = query
            .status
            .as_deref()
            .map(str::parse::<TransactionStatus>)
            .transpose()?;
        self.list(user_id, PartySide::Either, status).await
    }

    /// Requests waiting for `owner_id` to accept or decline
    pub async fn pending_received(&self, owner_id: &str) -> DomainResult<Vec<TransactionDetails>> {
        self.list(owner_id, PartySide::Owner, Some(TransactionStatus::Pending))
            .await
    }

    /// Books `user_id` currently has from others
    pub async fn active_borrowed(&self, user_id: &str) -> DomainResult<Vec<TransactionDetails>> {
        self.list(user_id, PartySide::Requester, Some(TransactionStatus::Active))
            .await
    }

    /// Books of `user_id` currently with others
    pub async fn active_lent(&self, user_id: &str) -> DomainResult<Vec<TransactionDetails>> {
        self.list(user_id, PartySide::Owner, Some(TransactionStatus::Active))
            .await
    }

    async fn list(
        &self,
        user_id: &str,
        side: PartySide,
        status: Option<TransactionStatus>,
    ) -> DomainResult<Vec<TransactionDetails>> {
        let transactions = self
            .transaction_repository
            .list_for_user(user_id, side, status)
            .await?;

        let mut details = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            details.push(self.details(transaction).await?);
        }
        Ok(details)
    }

    async fn details(&self, transaction: Transaction) -> DomainResult<TransactionDetails> {
        let book = self.book_repository.get_book(&transaction.book_id).await?;
        let owner = self.user_repository.get_user(&transaction.owner_id).await?;
        let requester = self
            .user_repository
            .get_user(&transaction.requester_id)
            .await?;

        Ok(TransactionDetails {
            transaction,
            book,
            owner,
            requester,
        })
    }

    async fn require_book(&self, book_id: &str) -> DomainResult<Book> {
        self.book_repository
            .get_book(book_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Book {} not found", book_id)))
    }

    async fn require_transaction(&self, transaction_id: &str) -> DomainResult<Transaction> {
        self.transaction_repository
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Transaction {} not found", transaction_id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::user::User;
    use crate::storage::test_utils::TestEnvironment;
    use crate::storage::DbConnection;
    use chrono::Duration;

    struct Fixture {
        env: TestEnvironment,
        service: TransactionService<DbConnection>,
        owner: User,
        requester: User,
        book: Book,
    }

    async fn fixture() -> Fixture {
        let env = TestEnvironment::new().await.unwrap();
        let owner = env.add_user("owner").await;
        let requester = env.add_user("requester").await;
        let book = env.add_book(&owner, "Dune").await;
        let connection = Arc::new(env.connection.clone());
        let service = TransactionService::new(connection.clone(), TrustService::new(connection));
        Fixture {
            env,
            service,
            owner,
            requester,
            book,
        }
    }

    fn create_command(f: &Fixture, requester: &User) -> CreateTransactionCommand {
        CreateTransactionCommand {
            requester_id: requester.id.clone(),
            book_id: f.book.id.clone(),
            owner_id: f.owner.id.clone(),
            transaction_type: "borrow".to_string(),
            expected_return_date: Some(Utc::now() + Duration::days(14)),
            security_deposit: None,
            rental_fee: Some(2.5),
            notes: Some("Can pick up on Saturday".to_string()),
        }
    }

    fn status_command(actor: &User, tx: &Transaction, status: &str) -> UpdateTransactionStatusCommand {
        UpdateTransactionStatusCommand {
            actor_id: actor.id.clone(),
            transaction_id: tx.id.clone(),
            new_status: status.to_string(),
            actual_return_date: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_pending() {
        let f = fixture().await;
        let tx = f
            .service
            .create_transaction(create_command(&f, &f.requester))
            .await
            .unwrap();

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.security_deposit, 0.0);
        assert_eq!(tx.rental_fee, 2.5);
        assert!(tx.start_date.is_none());
    }

    #[tokio::test]
    async fn test_create_rejections() {
        let f = fixture().await;

        let own_book = f.service.create_transaction(create_command(&f, &f.owner)).await;
        assert!(matches!(own_book, Err(DomainError::Conflict(_))));

        let mut bad_type = create_command(&f, &f.requester);
        bad_type.transaction_type = "lend".to_string();
        assert!(matches!(
            f.service.create_transaction(bad_type).await,
            Err(DomainError::Validation(_))
        ));

        let mut negative = create_command(&f, &f.requester);
        negative.security_deposit = Some(-1.0);
        assert!(matches!(
            f.service.create_transaction(negative).await,
            Err(DomainError::Validation(_))
        ));

        let mut wrong_owner = create_command(&f, &f.requester);
        wrong_owner.owner_id = f.requester.id.clone();
        assert!(matches!(
            f.service.create_transaction(wrong_owner).await,
            Err(DomainError::Validation(_))
        ));

        let mut missing_book = create_command(&f, &f.requester);
        missing_book.book_id = "missing".to_string();
        assert!(matches!(
            f.service.create_transaction(missing_book).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_one_open_transaction_per_book() {
        let f = fixture().await;
        let other = f.env.add_user("other").await;

        let first = f
            .service
            .create_transaction(create_command(&f, &f.requester))
            .await
            .unwrap();
        let second = f.service.create_transaction(create_command(&f, &other)).await;
        assert!(matches!(second, Err(DomainError::Conflict(_))));

        f.service
            .update_status(status_command(&f.requester, &first, "cancelled"))
            .await
            .unwrap();
        assert!(f
            .service
            .create_transaction(create_command(&f, &other))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_lifecycle_to_completed_recomputes_both_parties() {
        let f = fixture().await;
        let tx = f
            .service
            .create_transaction(create_command(&f, &f.requester))
            .await
            .unwrap();

        let active = f
            .service
            .update_status(status_command(&f.owner, &tx, "active"))
            .await
            .unwrap();
        assert_eq!(active.status, TransactionStatus::Active);
        assert!(active.start_date.is_some());

        let mut complete = status_command(&f.owner, &tx, "completed");
        complete.notes = Some("Returned with a bookmark".to_string());
        let completed = f.service.update_status(complete).await.unwrap();
        assert_eq!(completed.status, TransactionStatus::Completed);
        assert!(completed.actual_return_date.is_some());
        assert_eq!(completed.notes.as_deref(), Some("Returned with a bookmark"));

        let users = f.env.connection.create_user_repository();
        for id in [&f.owner.id, &f.requester.id] {
            let user = users.get_user(id).await.unwrap().unwrap();
            assert_eq!(user.total_transactions, 1);
            assert_eq!(user.successful_transactions, 1);
            assert_eq!(user.late_returns, 0);
        }
    }

    #[tokio::test]
    async fn test_transition_permissions() {
        let f = fixture().await;
        let stranger = f.env.add_user("stranger").await;
        let tx = f
            .service
            .create_transaction(create_command(&f, &f.requester))
            .await
            .unwrap();

        let by_stranger = f
            .service
            .update_status(status_command(&stranger, &tx, "cancelled"))
            .await;
        assert!(matches!(by_stranger, Err(DomainError::Permission(_))));

        let by_requester = f
            .service
            .update_status(status_command(&f.requester, &tx, "active"))
            .await;
        assert!(matches!(by_requester, Err(DomainError::Permission(_))));

        let skip_ahead = f
            .service
            .update_status(status_command(&f.owner, &tx, "completed"))
            .await;
        assert!(matches!(skip_ahead, Err(DomainError::Validation(_))));

        let unknown = f
            .service
            .update_status(status_command(&f.owner, &tx, "returned"))
            .await;
        assert!(matches!(unknown, Err(DomainError::Validation(_))));

        f.service
            .update_status(status_command(&f.owner, &tx, "active"))
            .await
            .unwrap();
        f.service
            .update_status(status_command(&f.requester, &tx, "overdue"))
            .await
            .unwrap();
        f.service
            .update_status(status_command(&f.requester, &tx, "cancelled"))
            .await
            .unwrap();

        let reopen = f
            .service
            .update_status(status_command(&f.owner, &tx, "active"))
            .await;
        assert!(matches!(reopen, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_late_completion_counts_as_late_return() {
        let f = fixture().await;
        let mut command = create_command(&f, &f.requester);
        command.expected_return_date = Some(Utc::now() - Duration::days(2));
        let tx = f.service.create_transaction(command).await.unwrap();

        f.service
            .update_status(status_command(&f.owner, &tx, "active"))
            .await
            .unwrap();
        f.service
            .update_status(status_command(&f.owner, &tx, "completed"))
            .await
            .unwrap();

        let requester = f
            .env
            .connection
            .create_user_repository()
            .get_user(&f.requester.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(requester.late_returns, 1);
    }

    #[tokio::test]
    async fn test_listing_views() {
        let f = fixture().await;
        let tx = f
            .service
            .create_transaction(create_command(&f, &f.requester))
            .await
            .unwrap();

        let received = f.service.pending_received(&f.owner.id).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].other_username(&f.owner.id), Some("requester"));
        assert!(f.service.pending_received(&f.requester.id).await.unwrap().is_empty());

        f.service
            .update_status(status_command(&f.owner, &tx, "active"))
            .await
            .unwrap();
        assert_eq!(f.service.active_borrowed(&f.requester.id).await.unwrap().len(), 1);
        assert_eq!(f.service.active_lent(&f.owner.id).await.unwrap().len(), 1);
        assert!(f.service.active_lent(&f.requester.id).await.unwrap().is_empty());

        let filtered = f
            .service
            .list_transactions(
                &f.requester.id,
                TransactionListQuery {
                    status: Some("active".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].book.as_ref().map(|b| b.title.as_str()), Some("Dune"));

        let invalid = f
            .service
            .list_transactions(
                &f.requester.id,
                TransactionListQuery {
                    status: Some("lost".to_string()),
                },
            )
            .await;
        assert!(matches!(invalid, Err(DomainError::Validation(_))));

        let stranger = f.env.add_user("stranger").await;
        assert!(matches!(
            f.service.get_transaction(&stranger.id, &tx.id).await,
            Err(DomainError::Permission(_))
        ));
    }
}
