use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::error::DomainResult;
use crate::domain::models::book::Book;
use crate::storage::connection::DbConnection;
use crate::storage::traits::BookStorage;

/// Repository for book listings
#[derive(Clone)]
pub struct BookRepository {
    db: DbConnection,
}

impl BookRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn book_from_row(row: &SqliteRow) -> DomainResult<Book> {
        Ok(Book {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author: row.try_get("author")?,
            owner_id: row.try_get("owner_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl BookStorage for BookRepository {
    async fn store_book(&self, book: &Book) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, owner_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.owner_id)
        .bind(book.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_book(&self, book_id: &str) -> DomainResult<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, author, owner_id, created_at
            FROM books
            WHERE id = ?
            "#,
        )
        .bind(book_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::book_from_row).transpose()
    }

    async fn list_books(&self, owner_id: Option<&str>) -> DomainResult<Vec<Book>> {
        let rows = match owner_id {
            Some(owner_id) => {
                sqlx::query(
                    r#"
                    SELECT id, title, author, owner_id, created_at
                    FROM books
                    WHERE owner_id = ?
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(owner_id)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, title, author, owner_id, created_at
                    FROM books
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(self.db.pool())
                .await?
            }
        };

        rows.iter().map(Self::book_from_row).collect()
    }

    async fn count_books_by_owner(&self, owner_id: &str) -> DomainResult<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count as u32)
    }

    async fn list_books_in_city(
        &self,
        city: &str,
        excluding_owner_id: &str,
    ) -> DomainResult<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.title, b.author, b.owner_id, b.created_at
            FROM books b
            JOIN users u ON u.id = b.owner_id
            WHERE u.city = ? AND b.owner_id != ?
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(city)
        .bind(excluding_owner_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::book_from_row).collect()
    }
}
