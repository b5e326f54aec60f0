use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::error::DomainResult;
use crate::domain::models::book_request::BookRequest;
use crate::storage::connection::DbConnection;
use crate::storage::traits::BookRequestStorage;

#[derive(Clone)]
pub struct BookRequestRepository {
    db: DbConnection,
}

impl BookRequestRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn request_from_row(row: &SqliteRow) -> DomainResult<BookRequest> {
        Ok(BookRequest {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            book_title: row.try_get("book_title")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl BookRequestStorage for BookRequestRepository {
    async fn store_request(&self, request: &BookRequest) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO book_requests (id, user_id, book_title, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(&request.user_id)
        .bind(&request.book_title)
        .bind(request.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<BookRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_title, created_at
            FROM book_requests
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::request_from_row).collect()
    }
}
