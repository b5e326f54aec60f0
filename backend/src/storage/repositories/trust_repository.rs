use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::commands::trust::TrustUpdate;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::badge::TrustBadge;
use crate::storage::connection::DbConnection;
use crate::storage::traits::TrustStorage;

/// Repository for trust badges and the cached trust fields on users
#[derive(Clone)]
pub struct TrustRepository {
    db: DbConnection,
}

impl TrustRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn badge_from_row(row: &SqliteRow) -> DomainResult<TrustBadge> {
        Ok(TrustBadge {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            badge_type: row.try_get("badge_type")?,
            earned_date: row.try_get("earned_date")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

#[async_trait]
impl TrustStorage for TrustRepository {
    async fn list_badges(&self, user_id: &str) -> DomainResult<Vec<TrustBadge>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, badge_type, earned_date, is_active
            FROM trust_badges
            WHERE user_id = ?
            ORDER BY earned_date ASC, badge_type ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::badge_from_row).collect()
    }

    async fn apply_trust_update(&self, update: &TrustUpdate) -> DomainResult<()> {
        let mut tx = self.db.pool().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET average_rating = ?, total_ratings = ?, total_transactions = ?,
                successful_transactions = ?, late_returns = ?,
                trust_score = ?, is_profile_hidden = ?
            WHERE id = ?
            "#,
        )
        .bind(update.aggregate.average_rating)
        .bind(update.aggregate.total_ratings as i64)
        .bind(update.aggregate.total_transactions as i64)
        .bind(update.aggregate.successful_transactions as i64)
        .bind(update.aggregate.late_returns as i64)
        .bind(update.trust_score)
        .bind(update.is_profile_hidden)
        .bind(&update.user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "User {} not found",
                update.user_id
            )));
        }

        sqlx::query("UPDATE trust_badges SET is_active = FALSE WHERE user_id = ?")
            .bind(&update.user_id)
            .execute(&mut *tx)
            .await?;

        // Re-earned badges keep their first earned_date
        let now = Utc::now();
        for badge in &update.badges {
            sqlx::query(
                r#"
                INSERT INTO trust_badges (id, user_id, badge_type, earned_date, is_active)
                VALUES (?, ?, ?, ?, TRUE)
                ON CONFLICT (user_id, badge_type) DO UPDATE SET is_active = TRUE
                "#,
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&update.user_id)
            .bind(badge.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::badge::BadgeType;
    use crate::domain::trust_scoring::TrustAggregate;
    use crate::storage::test_utils::TestEnvironment;
    use crate::storage::traits::{Connection, UserStorage};
    use std::collections::BTreeSet;

    fn update(user_id: &str, score: f64, badges: &[BadgeType]) -> TrustUpdate {
        TrustUpdate {
            user_id: user_id.to_string(),
            aggregate: TrustAggregate {
                average_rating: 4.5,
                total_ratings: 2,
                total_transactions: 3,
                successful_transactions: 2,
                late_returns: 1,
            },
            trust_score: score,
            is_profile_hidden: false,
            badges: badges.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[tokio::test]
    async fn test_apply_writes_counters_and_badges() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;
        let repo = TrustRepository::new(env.connection.clone());

        repo.apply_trust_update(&update(&alice.id, 71.25, &[BadgeType::Verified, BadgeType::NewUser]))
            .await
            .unwrap();

        let stored = env
            .connection
            .create_user_repository()
            .get_user(&alice.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.trust_score, 71.25);
        assert_eq!(stored.total_transactions, 3);
        assert_eq!(stored.late_returns, 1);
        assert_eq!(stored.average_rating, 4.5);

        let badges = repo.list_badges(&alice.id).await.unwrap();
        assert_eq!(badges.len(), 2);
        assert!(badges.iter().all(|b| b.is_active));
    }

    #[tokio::test]
    async fn test_lost_badges_are_deactivated_not_deleted() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;
        let repo = TrustRepository::new(env.connection.clone());

        repo.apply_trust_update(&update(&alice.id, 50.0, &[BadgeType::NewUser, BadgeType::Verified]))
            .await
            .unwrap();
        let earned = repo.list_badges(&alice.id).await.unwrap();
        let new_user_earned = earned
            .iter()
            .find(|b| b.badge_type == "new_user")
            .map(|b| b.earned_date)
            .unwrap();

        repo.apply_trust_update(&update(&alice.id, 50.0, &[BadgeType::Verified]))
            .await
            .unwrap();
        let badges = repo.list_badges(&alice.id).await.unwrap();
        assert_eq!(badges.len(), 2);
        let new_user = badges.iter().find(|b| b.badge_type == "new_user").unwrap();
        assert!(!new_user.is_active);

        repo.apply_trust_update(&update(&alice.id, 50.0, &[BadgeType::NewUser, BadgeType::Verified]))
            .await
            .unwrap();
        let badges = repo.list_badges(&alice.id).await.unwrap();
        assert_eq!(badges.len(), 2);
        let new_user = badges.iter().find(|b| b.badge_type == "new_user").unwrap();
        assert!(new_user.is_active);
        assert_eq!(new_user.earned_date, new_user_earned);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = TrustRepository::new(env.connection.clone());

        let result = repo.apply_trust_update(&update("ghost", 45.0, &[])).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
