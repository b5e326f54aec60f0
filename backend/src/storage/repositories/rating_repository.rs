use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashSet;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::rating::{Rating, RatingRole};
use crate::storage::connection::DbConnection;
use crate::storage::traits::RatingStorage;

const RATING_COLUMNS: &str = r#"
    id, rater_id, rated_user_id, transaction_id, rating, review_text, rating_type, created_at
"#;

/// Repository for user ratings
#[derive(Clone)]
pub struct RatingRepository {
    db: DbConnection,
}

impl RatingRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn rating_from_row(row: &SqliteRow) -> DomainResult<Rating> {
        let role: String = row.try_get("rating_type")?;
        let score: i64 = row.try_get("rating")?;

        Ok(Rating {
            id: row.try_get("id")?,
            rater_id: row.try_get("rater_id")?,
            rated_user_id: row.try_get("rated_user_id")?,
            transaction_id: row.try_get("transaction_id")?,
            score: Rating::validate_score(score)
                .map_err(|e| DomainError::Internal(format!("Corrupt rating row: {}", e)))?,
            review_text: row.try_get("review_text")?,
            role: role
                .parse::<RatingRole>()
                .map_err(|e| DomainError::Internal(format!("Corrupt rating row: {}", e)))?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl RatingStorage for RatingRepository {
    async fn store_rating(&self, rating: &Rating) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_ratings (
                id, rater_id, rated_user_id, transaction_id, rating, review_text, rating_type, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&rating.id)
        .bind(&rating.rater_id)
        .bind(&rating.rated_user_id)
        .bind(&rating.transaction_id)
        .bind(rating.score as i64)
        .bind(&rating.review_text)
        .bind(rating.role.as_str())
        .bind(rating.created_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| DomainError::from_insert(e, "You have already rated this transaction"))?;
        Ok(())
    }

    async fn find_by_rater_and_transaction(
        &self,
        rater_id: &str,
        transaction_id: &str,
    ) -> DomainResult<Option<Rating>> {
        let sql = format!(
            "SELECT {} FROM user_ratings WHERE rater_id = ? AND transaction_id = ?",
            RATING_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(rater_id)
            .bind(transaction_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::rating_from_row).transpose()
    }

    async fn list_received(&self, user_id: &str, limit: Option<u32>) -> DomainResult<Vec<Rating>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(i64::from).unwrap_or(-1);
        let sql = format!(
            r#"
            SELECT {} FROM user_ratings
            WHERE rated_user_id = ?
            ORDER BY created_at DESC, id ASC
            LIMIT ?
            "#,
            RATING_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::rating_from_row).collect()
    }

    async fn list_for_transaction(&self, transaction_id: &str) -> DomainResult<Vec<Rating>> {
        let sql = format!(
            "SELECT {} FROM user_ratings WHERE transaction_id = ? ORDER BY created_at ASC",
            RATING_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(transaction_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::rating_from_row).collect()
    }

    async fn rated_transaction_ids(&self, rater_id: &str) -> DomainResult<HashSet<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT transaction_id FROM user_ratings WHERE rater_id = ?")
                .bind(rater_id)
                .fetch_all(self.db.pool())
                .await?;
        Ok(ids.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::transaction::TransactionStatus;
    use crate::storage::test_utils::TestEnvironment;
    use chrono::{Duration, Utc};

    fn rating(rater: &str, rated: &str, tx: &str, score: u8, age_minutes: i64) -> Rating {
        Rating {
            id: Rating::generate_id(),
            rater_id: rater.to_string(),
            rated_user_id: rated.to_string(),
            transaction_id: tx.to_string(),
            score,
            review_text: Some("Lovely exchange".to_string()),
            role: RatingRole::Lender,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn test_one_rating_per_rater_and_transaction() {
        let env = TestEnvironment::new().await.unwrap();
        let owner = env.add_user("owner").await;
        let requester = env.add_user("requester").await;
        let book = env.add_book(&owner, "Dune").await;
        let tx = env
            .add_transaction(&book, &requester, TransactionStatus::Completed, None, None)
            .await;
        let repo = RatingRepository::new(env.connection.clone());

        let first = rating(&requester.id, &owner.id, &tx.id, 5, 0);
        repo.store_rating(&first).await.unwrap();

        let again = rating(&requester.id, &owner.id, &tx.id, 1, 0);
        let result = repo.store_rating(&again).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));

        // The other party may still rate
        repo.store_rating(&rating(&owner.id, &requester.id, &tx.id, 4, 0))
            .await
            .unwrap();

        let found = repo
            .find_by_rater_and_transaction(&requester.id, &tx.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.score, 5);
        assert_eq!(found.role, RatingRole::Lender);
        assert_eq!(repo.list_for_transaction(&tx.id).await.unwrap().len(), 2);
        assert!(repo
            .rated_transaction_ids(&requester.id)
            .await
            .unwrap()
            .contains(&tx.id));
    }

    #[tokio::test]
    async fn test_list_received_is_newest_first_and_limited() {
        let env = TestEnvironment::new().await.unwrap();
        let owner = env.add_user("owner").await;
        let repo = RatingRepository::new(env.connection.clone());

        for (i, name) in ["r1", "r2", "r3"].iter().enumerate() {
            let rater = env.add_user(name).await;
            let book = env.add_book(&owner, name).await;
            let tx = env
                .add_transaction(&book, &rater, TransactionStatus::Completed, None, None)
                .await;
            let age = 10 - i as i64;
            repo.store_rating(&rating(&rater.id, &owner.id, &tx.id, (i + 3) as u8, age))
                .await
                .unwrap();
        }

        let all = repo.list_received(&owner.id, None).await.unwrap();
        let scores: Vec<u8> = all.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![5, 4, 3]);

        let limited = repo.list_received(&owner.id, Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].score, 5);
    }
}
