//! Test utilities shared by repository and service tests.
//!
//! Every `TestEnvironment` owns a private in-memory database, so tests never
//! see each other's rows and nothing has to be cleaned up afterwards.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::domain::models::{
    book::Book,
    transaction::{Transaction, TransactionStatus, TransactionType},
    user::User,
};
use crate::storage::connection::DbConnection;
use crate::storage::traits::{BookStorage, Connection, TransactionStorage, UserStorage};

pub struct TestEnvironment {
    pub connection: DbConnection,
}

impl TestEnvironment {
    pub async fn new() -> Result<Self> {
        Ok(Self {
            connection: DbConnection::in_memory().await?,
        })
    }

    /// Insert a user with neutral trust fields
    pub async fn add_user(&self, username: &str) -> User {
        self.add_user_in_city(username, None).await
    }

    pub async fn add_user_in_city(&self, username: &str, city: Option<&str>) -> User {
        let user = User {
            id: User::generate_id(),
            username: username.to_string(),
            email: None,
            password_hash: "not-a-real-hash".to_string(),
            city: city.map(str::to_string),
            created_at: Utc::now(),
            average_rating: 0.0,
            total_ratings: 0,
            total_transactions: 0,
            successful_transactions: 0,
            late_returns: 0,
            trust_score: 45.0,
            is_profile_hidden: false,
        };
        self.connection
            .create_user_repository()
            .store_user(&user)
            .await
            .expect("Failed to seed user");
        user
    }

    pub async fn add_book(&self, owner: &User, title: &str) -> Book {
        let book = Book {
            id: Book::generate_id(),
            title: title.to_string(),
            author: None,
            owner_id: owner.id.clone(),
            created_at: Utc::now(),
        };
        self.connection
            .create_book_repository()
            .store_book(&book)
            .await
            .expect("Failed to seed book");
        book
    }

    /// Insert a transaction directly in the given state, bypassing the ledger rules
    pub async fn add_transaction(
        &self,
        book: &Book,
        requester: &User,
        status: TransactionStatus,
        expected_return_date: Option<DateTime<Utc>>,
        actual_return_date: Option<DateTime<Utc>>,
    ) -> Transaction {
        let now = Utc::now();
        let transaction = Transaction {
            id: Transaction::generate_id(),
            book_id: book.id.clone(),
            owner_id: book.owner_id.clone(),
            requester_id: requester.id.clone(),
            transaction_type: TransactionType::Borrow,
            status,
            start_date: None,
            expected_return_date,
            actual_return_date,
            security_deposit: 0.0,
            rental_fee: 0.0,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.connection
            .create_transaction_repository()
            .store_transaction(&transaction)
            .await
            .expect("Failed to seed transaction");
        transaction
    }
}
