use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::transaction::{Transaction, TransactionStatus, TransactionType};
use crate::storage::connection::DbConnection;
use crate::storage::traits::{PartySide, TransactionStorage};

const TRANSACTION_COLUMNS: &str = r#"
    id, book_id, owner_id, requester_id, transaction_type, status,
    start_date, expected_return_date, actual_return_date,
    security_deposit, rental_fee, notes, created_at, updated_at
"#;

/// Repository for lending transactions
#[derive(Clone)]
pub struct TransactionRepository {
    db: DbConnection,
}

impl TransactionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn transaction_from_row(row: &SqliteRow) -> DomainResult<Transaction> {
        let transaction_type: String = row.try_get("transaction_type")?;
        let status: String = row.try_get("status")?;

        Ok(Transaction {
            id: row.try_get("id")?,
            book_id: row.try_get("book_id")?,
            owner_id: row.try_get("owner_id")?,
            requester_id: row.try_get("requester_id")?,
            transaction_type: transaction_type
                .parse::<TransactionType>()
                .map_err(|e| DomainError::Internal(format!("Corrupt transaction row: {}", e)))?,
            status: status
                .parse::<TransactionStatus>()
                .map_err(|e| DomainError::Internal(format!("Corrupt transaction row: {}", e)))?,
            start_date: row.try_get("start_date")?,
            expected_return_date: row.try_get("expected_return_date")?,
            actual_return_date: row.try_get("actual_return_date")?,
            security_deposit: row.try_get("security_deposit")?,
            rental_fee: row.try_get("rental_fee")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl TransactionStorage for TransactionRepository {
    async fn store_transaction(&self, transaction: &Transaction) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, book_id, owner_id, requester_id, transaction_type, status,
                start_date, expected_return_date, actual_return_date,
                security_deposit, rental_fee, notes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.book_id)
        .bind(&transaction.owner_id)
        .bind(&transaction.requester_id)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.status.as_str())
        .bind(transaction.start_date)
        .bind(transaction.expected_return_date)
        .bind(transaction.actual_return_date)
        .bind(transaction.security_deposit)
        .bind(transaction.rental_fee)
        .bind(&transaction.notes)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            DomainError::from_insert(e, "Book already has a pending or active transaction")
        })?;
        Ok(())
    }

    async fn get_transaction(&self, transaction_id: &str) -> DomainResult<Option<Transaction>> {
        let sql = format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(transaction_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::transaction_from_row).transpose()
    }

    async fn find_open_for_book(&self, book_id: &str) -> DomainResult<Option<Transaction>> {
        let sql = format!(
            r#"
            SELECT {} FROM transactions
            WHERE book_id = ? AND status IN ('pending', 'active')
            LIMIT 1
            "#,
            TRANSACTION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(book_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::transaction_from_row).transpose()
    }

    async fn update_transaction(
        &self,
        transaction: &Transaction,
        expected_status: TransactionStatus,
    ) -> DomainResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = ?, start_date = ?, actual_return_date = ?, notes = ?, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(transaction.status.as_str())
        .bind(transaction.start_date)
        .bind(transaction.actual_return_date)
        .bind(&transaction.notes)
        .bind(transaction.updated_at)
        .bind(&transaction.id)
        .bind(expected_status.as_str())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        side: PartySide,
        status: Option<TransactionStatus>,
    ) -> DomainResult<Vec<Transaction>> {
        let party_clause = match side {
            PartySide::Either => "(owner_id = ?1 OR requester_id = ?1)",
            PartySide::Owner => "owner_id = ?1",
            PartySide::Requester => "requester_id = ?1",
        };
        let status_clause = if status.is_some() { "AND status = ?2" } else { "" };
        let sql = format!(
            r#"
            SELECT {} FROM transactions
            WHERE {} {}
            ORDER BY created_at DESC, id ASC
            "#,
            TRANSACTION_COLUMNS, party_clause, status_clause
        );

        let mut query = sqlx::query(&sql).bind(user_id);
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }
        let rows = query.fetch_all(self.db.pool()).await?;

        rows.iter().map(Self::transaction_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::TestEnvironment;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_store_and_get_round_trips_optional_fields() {
        let env = TestEnvironment::new().await.unwrap();
        let owner = env.add_user("owner").await;
        let requester = env.add_user("requester").await;
        let book = env.add_book(&owner, "Dune").await;
        let due = Utc::now() + Duration::days(14);

        let tx = env
            .add_transaction(&book, &requester, TransactionStatus::Pending, Some(due), None)
            .await;

        let repo = TransactionRepository::new(env.connection.clone());
        let loaded = repo.get_transaction(&tx.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TransactionStatus::Pending);
        assert_eq!(loaded.transaction_type, TransactionType::Borrow);
        assert_eq!(loaded.expected_return_date, Some(due));
        assert_eq!(loaded.actual_return_date, None);
        assert!(repo.get_transaction("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_open_transaction_on_book_is_conflict() {
        let env = TestEnvironment::new().await.unwrap();
        let owner = env.add_user("owner").await;
        let first = env.add_user("first").await;
        let second = env.add_user("second").await;
        let book = env.add_book(&owner, "Dune").await;
        let repo = TransactionRepository::new(env.connection.clone());

        let open = env
            .add_transaction(&book, &first, TransactionStatus::Pending, None, None)
            .await;
        assert_eq!(repo.find_open_for_book(&book.id).await.unwrap().unwrap().id, open.id);

        let mut duplicate = open.clone();
        duplicate.id = Transaction::generate_id();
        duplicate.requester_id = second.id.clone();
        let result = repo.store_transaction(&duplicate).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));

        // Closed transactions do not hold the book
        let mut cancelled = open.clone();
        cancelled.status = TransactionStatus::Cancelled;
        assert!(repo
            .update_transaction(&cancelled, TransactionStatus::Pending)
            .await
            .unwrap());
        assert!(repo.find_open_for_book(&book.id).await.unwrap().is_none());
        repo.store_transaction(&duplicate).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_is_compare_and_set_on_status() {
        let env = TestEnvironment::new().await.unwrap();
        let owner = env.add_user("owner").await;
        let requester = env.add_user("requester").await;
        let book = env.add_book(&owner, "Dune").await;
        let repo = TransactionRepository::new(env.connection.clone());

        let tx = env
            .add_transaction(&book, &requester, TransactionStatus::Pending, None, None)
            .await;

        let mut active = tx.clone();
        active.status = TransactionStatus::Active;
        active.start_date = Some(Utc::now());
        assert!(repo.update_transaction(&active, TransactionStatus::Pending).await.unwrap());

        // A writer that still believes the row is pending loses
        let mut stale = tx.clone();
        stale.status = TransactionStatus::Cancelled;
        assert!(!repo.update_transaction(&stale, TransactionStatus::Pending).await.unwrap());

        let loaded = repo.get_transaction(&tx.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TransactionStatus::Active);
        assert!(loaded.start_date.is_some());
    }

    #[tokio::test]
    async fn test_list_for_user_by_side_and_status() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;
        let bob = env.add_user("bob").await;
        let alice_book = env.add_book(&alice, "Dune").await;
        let bob_book = env.add_book(&bob, "Emma").await;
        let repo = TransactionRepository::new(env.connection.clone());

        let lent = env
            .add_transaction(&alice_book, &bob, TransactionStatus::Active, None, None)
            .await;
        let borrowed = env
            .add_transaction(&bob_book, &alice, TransactionStatus::Pending, None, None)
            .await;

        let all = repo.list_for_user(&alice.id, PartySide::Either, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let as_owner = repo.list_for_user(&alice.id, PartySide::Owner, None).await.unwrap();
        assert_eq!(as_owner.len(), 1);
        assert_eq!(as_owner[0].id, lent.id);

        let as_requester = repo
            .list_for_user(&alice.id, PartySide::Requester, Some(TransactionStatus::Pending))
            .await
            .unwrap();
        assert_eq!(as_requester.len(), 1);
        assert_eq!(as_requester[0].id, borrowed.id);

        let none = repo
            .list_for_user(&alice.id, PartySide::Either, Some(TransactionStatus::Completed))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
