use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::user::User;
use crate::storage::connection::DbConnection;
use crate::storage::traits::UserStorage;

const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, city, created_at,
    average_rating, total_ratings, total_transactions,
    successful_transactions, late_returns, trust_score, is_profile_hidden
"#;

/// Repository for user accounts and their cached trust fields
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn user_from_row(row: &SqliteRow) -> DomainResult<User> {
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            city: row.try_get("city")?,
            created_at: row.try_get("created_at")?,
            average_rating: row.try_get("average_rating")?,
            total_ratings: row.try_get::<i64, _>("total_ratings")? as u32,
            total_transactions: row.try_get::<i64, _>("total_transactions")? as u32,
            successful_transactions: row.try_get::<i64, _>("successful_transactions")? as u32,
            late_returns: row.try_get::<i64, _>("late_returns")? as u32,
            trust_score: row.try_get("trust_score")?,
            is_profile_hidden: row.try_get("is_profile_hidden")?,
        })
    }
}

#[async_trait]
impl UserStorage for UserRepository {
    async fn store_user(&self, user: &User) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, city, created_at,
                average_rating, total_ratings, total_transactions,
                successful_transactions, late_returns, trust_score, is_profile_hidden
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.city)
        .bind(user.created_at)
        .bind(user.average_rating)
        .bind(user.total_ratings as i64)
        .bind(user.total_transactions as i64)
        .bind(user.successful_transactions as i64)
        .bind(user.late_returns as i64)
        .bind(user.trust_score)
        .bind(user.is_profile_hidden)
        .execute(self.db.pool())
        .await
        .map_err(|e| DomainError::from_insert(e, "Username or email already registered"))?;
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> DomainResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn list_top_trusted(&self, limit: u32) -> DomainResult<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE is_profile_hidden = FALSE
            ORDER BY trust_score DESC, username ASC
            LIMIT ?
            "#,
            USER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::user_from_row).collect()
    }

    async fn list_owners_in_city(
        &self,
        title: &str,
        city: &str,
        excluding_user_id: &str,
    ) -> DomainResult<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE city = ?
              AND id != ?
              AND id IN (
                  SELECT owner_id FROM books
                  WHERE lower(trim(title)) = lower(trim(?))
              )
            ORDER BY username ASC
            "#,
            USER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(city)
            .bind(excluding_user_id)
            .bind(title)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::user_from_row).collect()
    }
}
