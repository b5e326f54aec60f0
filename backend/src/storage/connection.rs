use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::info;

use crate::storage::repositories::{
    BookRepository, BookRequestRepository, ChatRepository, RatingRepository,
    TransactionRepository, TrustRepository, UserRepository,
};
use crate::storage::traits::Connection;

/// DbConnection manages the SQLite pool and schema
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database at {}", url);
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Private in-memory database, one per call. Used by tests.
    pub async fn in_memory() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("sqlite:file:memdb_{}?mode=memory&cache=shared", test_id);

        // A single connection keeps shared-cache table locks out of the picture
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&db_url)
            .await?;
        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT UNIQUE,
                password_hash TEXT NOT NULL,
                city TEXT,
                created_at TEXT NOT NULL,
                average_rating REAL NOT NULL DEFAULT 0.0,
                total_ratings INTEGER NOT NULL DEFAULT 0,
                total_transactions INTEGER NOT NULL DEFAULT 0,
                successful_transactions INTEGER NOT NULL DEFAULT 0,
                late_returns INTEGER NOT NULL DEFAULT 0,
                trust_score REAL NOT NULL DEFAULT 45.0,
                is_profile_hidden BOOLEAN NOT NULL DEFAULT FALSE
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Leaderboard ordering
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_users_trust_score
            ON users(is_profile_hidden, trust_score DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT,
                owner_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_books_owner_id
            ON books(owner_id);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                book_id TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                requester_id TEXT NOT NULL,
                transaction_type TEXT NOT NULL
                    CHECK (transaction_type IN ('borrow', 'swap', 'buy', 'rent')),
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'active', 'completed', 'overdue', 'cancelled')),
                start_date TEXT,
                expected_return_date TEXT,
                actual_return_date TEXT,
                security_deposit REAL NOT NULL DEFAULT 0.0 CHECK (security_deposit >= 0),
                rental_fee REAL NOT NULL DEFAULT 0.0 CHECK (rental_fee >= 0),
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (owner_id != requester_id),
                FOREIGN KEY (book_id) REFERENCES books (id),
                FOREIGN KEY (owner_id) REFERENCES users (id),
                FOREIGN KEY (requester_id) REFERENCES users (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // At most one pending/active transaction per book, enforced even under racing inserts
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_one_open_per_book
            ON transactions(book_id) WHERE status IN ('pending', 'active');
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transactions_owner_id
            ON transactions(owner_id, created_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transactions_requester_id
            ON transactions(requester_id, created_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_ratings (
                id TEXT PRIMARY KEY,
                rater_id TEXT NOT NULL,
                rated_user_id TEXT NOT NULL,
                transaction_id TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
                review_text TEXT,
                rating_type TEXT NOT NULL
                    CHECK (rating_type IN ('borrower', 'lender', 'buyer', 'seller')),
                created_at TEXT NOT NULL,
                CHECK (rater_id != rated_user_id),
                UNIQUE (rater_id, transaction_id),
                FOREIGN KEY (rater_id) REFERENCES users (id),
                FOREIGN KEY (rated_user_id) REFERENCES users (id),
                FOREIGN KEY (transaction_id) REFERENCES transactions (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_user_ratings_rated_user_id
            ON user_ratings(rated_user_id, created_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trust_badges (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                badge_type TEXT NOT NULL,
                earned_date TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                UNIQUE (user_id, badge_type),
                FOREIGN KEY (user_id) REFERENCES users (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_rooms (
                id TEXT PRIMARY KEY,
                user1_id TEXT NOT NULL,
                user2_id TEXT NOT NULL,
                book_title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_message_at TEXT NOT NULL,
                CHECK (user1_id != user2_id),
                FOREIGN KEY (user1_id) REFERENCES users (id),
                FOREIGN KEY (user2_id) REFERENCES users (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // One room per unordered pair of members and title
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_chat_rooms_pair_title
            ON chat_rooms(min(user1_id, user2_id), max(user1_id, user2_id), book_title);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                chat_room_id TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                message TEXT NOT NULL,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL,
                FOREIGN KEY (chat_room_id) REFERENCES chat_rooms (id) ON DELETE CASCADE,
                FOREIGN KEY (sender_id) REFERENCES users (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_chat_messages_room
            ON chat_messages(chat_room_id, created_at);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS book_requests (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                book_title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

impl Connection for DbConnection {
    type UserRepository = UserRepository;
    type BookRepository = BookRepository;
    type TransactionRepository = TransactionRepository;
    type RatingRepository = RatingRepository;
    type TrustRepository = TrustRepository;
    type ChatRepository = ChatRepository;
    type BookRequestRepository = BookRequestRepository;

    fn create_user_repository(&self) -> Self::UserRepository {
        UserRepository::new(self.clone())
    }

    fn create_book_repository(&self) -> Self::BookRepository {
        BookRepository::new(self.clone())
    }

    fn create_transaction_repository(&self) -> Self::TransactionRepository {
        TransactionRepository::new(self.clone())
    }

    fn create_rating_repository(&self) -> Self::RatingRepository {
        RatingRepository::new(self.clone())
    }

    fn create_trust_repository(&self) -> Self::TrustRepository {
        TrustRepository::new(self.clone())
    }

    fn create_chat_repository(&self) -> Self::ChatRepository {
        ChatRepository::new(self.clone())
    }

    fn create_book_request_repository(&self) -> Self::BookRequestRepository {
        BookRequestRepository::new(self.clone())
    }
}
