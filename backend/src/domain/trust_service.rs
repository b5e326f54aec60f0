//! Trust service: recomputes and serves users' trust data.
//!
//! The recompute always rebuilds the aggregate from the full rating and
//! transaction history, so a recompute that failed earlier is repaired by the
//! next one.
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{
    commands::trust::{TrustProfile, TrustRecomputeResult, TrustSummary, TrustUpdate},
    error::{DomainError, DomainResult},
    models::user::User,
    rating_service::attach_rater_names,
    trust_scoring::{determine_badges, should_hide_profile, trust_score, MemberFacts, TrustAggregate},
};
use crate::storage::{
    BookStorage, Connection, PartySide, RatingStorage, TransactionStorage, TrustStorage,
    UserStorage,
};

pub const RECENT_RATINGS_ON_PROFILE: u32 = 10;
pub const DEFAULT_LEADERBOARD_SIZE: u32 = 10;
const RECOMPUTE_ATTEMPTS: usize = 2;

/// Persisted scores and averages keep two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Clone)]
pub struct TrustService<C: Connection> {
    user_repository: C::UserRepository,
    book_repository: C::BookRepository,
    transaction_repository: C::TransactionRepository,
    rating_repository: C::RatingRepository,
    trust_repository: C::TrustRepository,
}

impl<C: Connection> TrustService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            user_repository: connection.create_user_repository(),
            book_repository: connection.create_book_repository(),
            transaction_repository: connection.create_transaction_repository(),
            rating_repository: connection.create_rating_repository(),
            trust_repository: connection.create_trust_repository(),
        }
    }

    /// Recount everything for `user_id`, rescore, rebadge, and persist atomically.
    pub async fn recompute(&self, user_id: &str) -> DomainResult<TrustRecomputeResult> {
        let user = self.require_user(user_id).await?;

        let ratings = self.rating_repository.list_received(user_id, None).await?;
        let transactions = self
            .transaction_repository
            .list_for_user(user_id, PartySide::Either, None)
            .await?;
        let books_listed = self.book_repository.count_books_by_owner(user_id).await?;

        let mut aggregate = TrustAggregate::from_history(&ratings, &transactions);
        let score = round2(trust_score(&aggregate));
        let member = MemberFacts {
            joined_at: user.created_at,
            has_email: user.has_email(),
            books_listed,
        };
        let badges = determine_badges(&member, &aggregate, &ratings, Utc::now());
        aggregate.average_rating = round2(aggregate.average_rating);

        let update = TrustUpdate {
            user_id: user.id.clone(),
            aggregate,
            trust_score: score,
            is_profile_hidden: should_hide_profile(score, aggregate.total_ratings),
            badges: badges.clone(),
        };
        self.trust_repository.apply_trust_update(&update).await?;

        info!(
            "Recomputed trust for user {}: score={} ratings={} transactions={} badges={:?}",
            user.username, score, aggregate.total_ratings, aggregate.total_transactions, badges
        );

        Ok(TrustRecomputeResult {
            trust_score: score,
            badges,
        })
    }

    /// Recompute after a change that is already committed. Failures are
    /// retried once, then logged; the caller's change stands either way.
    pub async fn recompute_after_change(&self, user_id: &str) {
        for attempt in 1..=RECOMPUTE_ATTEMPTS {
            match self.recompute(user_id).await {
                Ok(_) => return,
                Err(e) => warn!(
                    "Trust recompute for user {} failed (attempt {}/{}): {}",
                    user_id, attempt, RECOMPUTE_ATTEMPTS, e
                ),
            }
        }
    }

    /// Manual recompute; users may only refresh their own score
    pub async fn update_trust_score(
        &self,
        actor_id: &str,
        user_id: &str,
    ) -> DomainResult<TrustRecomputeResult> {
        if actor_id != user_id {
            return Err(DomainError::permission(
                "You can only update your own trust score",
            ));
        }
        self.recompute(user_id).await
    }

    pub async fn get_profile(&self, user_id: &str) -> DomainResult<TrustProfile> {
        let user = self.require_user(user_id).await?;

        let badges = self
            .trust_repository
            .list_badges(user_id)
            .await?
            .into_iter()
            .filter(|b| b.is_active)
            .collect();

        let recent = self
            .rating_repository
            .list_received(user_id, Some(RECENT_RATINGS_ON_PROFILE))
            .await?;
        let recent_ratings = attach_rater_names(&self.user_repository, recent).await?;

        Ok(TrustProfile {
            user,
            badges,
            recent_ratings,
        })
    }

    pub async fn get_summary(&self, user_id: &str) -> DomainResult<TrustSummary> {
        let user = self.require_user(user_id).await?;
        self.summarize(user).await
    }

    /// Visible users ordered by trust score
    pub async fn leaderboard(&self, limit: Option<u32>) -> DomainResult<Vec<TrustSummary>> {
        let limit = limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE);
        let users = self.user_repository.list_top_trusted(limit).await?;

        let mut summaries = Vec::with_capacity(users.len());
        for user in users {
            summaries.push(self.summarize(user).await?);
        }
        Ok(summaries)
    }

    async fn summarize(&self, user: User) -> DomainResult<TrustSummary> {
        let active_badges = self
            .trust_repository
            .list_badges(&user.id)
            .await?
            .into_iter()
            .filter(|b| b.is_active)
            .map(|b| b.badge_type)
            .collect();

        Ok(TrustSummary {
            user,
            active_badges,
        })
    }

    async fn require_user(&self, user_id: &str) -> DomainResult<User> {
        self.user_repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User {} not found", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        badge::BadgeType,
        rating::{Rating, RatingRole},
        transaction::TransactionStatus,
    };
    use crate::storage::test_utils::TestEnvironment;
    use crate::storage::DbConnection;
    use chrono::Duration;

    fn service(env: &TestEnvironment) -> TrustService<DbConnection> {
        TrustService::new(Arc::new(env.connection.clone()))
    }

    async fn rate(env: &TestEnvironment, rater: &User, rated: &User, tx_id: &str, score: u8) {
        env.connection
            .create_rating_repository()
            .store_rating(&Rating {
                id: Rating::generate_id(),
                rater_id: rater.id.clone(),
                rated_user_id: rated.id.clone(),
                transaction_id: tx_id.to_string(),
                score,
                review_text: None,
                role: RatingRole::Lender,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(94.633333), 94.63);
        assert_eq!(round2(4.666666), 4.67);
        assert_eq!(round2(45.0), 45.0);
    }

    #[tokio::test]
    async fn test_recompute_new_user_is_neutral() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;

        let result = service(&env).recompute(&alice.id).await.unwrap();
        assert_eq!(result.trust_score, 45.0);
        assert!(result.badges.contains(&BadgeType::NewUser));
        assert!(!result.badges.contains(&BadgeType::Verified));

        let summary = service(&env).get_summary(&alice.id).await.unwrap();
        assert_eq!(summary.user.trust_score, 45.0);
        assert_eq!(summary.active_badges, vec!["new_user".to_string()]);
    }

    #[tokio::test]
    async fn test_recompute_counts_history() {
        let env = TestEnvironment::new().await.unwrap();
        let owner = env.add_user("owner").await;
        let requester = env.add_user("requester").await;
        let now = Utc::now();

        let book1 = env.add_book(&owner, "Dune").await;
        let book2 = env.add_book(&owner, "Emma").await;
        let on_time = env
            .add_transaction(
                &book1,
                &requester,
                TransactionStatus::Completed,
                Some(now),
                Some(now - Duration::days(1)),
            )
            .await;
        env.add_transaction(
            &book2,
            &requester,
            TransactionStatus::Completed,
            Some(now - Duration::days(3)),
            Some(now),
        )
        .await;
        rate(&env, &requester, &owner, &on_time.id, 4).await;

        service(&env).recompute(&owner.id).await.unwrap();
        let stored = env
            .connection
            .create_user_repository()
            .get_user(&owner.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stored.total_transactions, 2);
        assert_eq!(stored.successful_transactions, 2);
        assert_eq!(stored.late_returns, 1);
        assert_eq!(stored.total_ratings, 1);
        assert_eq!(stored.average_rating, 4.0);
        // rating 32.5, success 24, punctuality 0, activity 1
        assert_eq!(stored.trust_score, 57.5);
    }

    #[tokio::test]
    async fn test_badge_cleared_then_reactivated_without_duplicate() {
        let env = TestEnvironment::new().await.unwrap();
        let owner = env.add_user("owner").await;
        let service = service(&env);

        service.recompute(&owner.id).await.unwrap();

        // Three transactions push the owner out of `new_user`
        for name in ["a", "b", "c"] {
            let requester = env.add_user(name).await;
            let book = env.add_book(&owner, name).await;
            env.add_transaction(&book, &requester, TransactionStatus::Cancelled, None, None)
                .await;
        }
        let result = service.recompute(&owner.id).await.unwrap();
        assert!(!result.badges.contains(&BadgeType::NewUser));

        let badges = env
            .connection
            .create_trust_repository()
            .list_badges(&owner.id)
            .await
            .unwrap();
        assert_eq!(badges.len(), 1);
        assert!(!badges[0].is_active);

        let summary = service.get_summary(&owner.id).await.unwrap();
        assert!(summary.active_badges.is_empty());
    }

    #[tokio::test]
    async fn test_manual_update_is_self_only() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;
        let bob = env.add_user("bob").await;

        let result = service(&env).update_trust_score(&bob.id, &alice.id).await;
        assert!(matches!(result, Err(DomainError::Permission(_))));

        let result = service(&env).update_trust_score(&alice.id, &alice.id).await.unwrap();
        assert_eq!(result.trust_score, 45.0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let env = TestEnvironment::new().await.unwrap();
        assert!(matches!(
            service(&env).recompute("ghost").await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            service(&env).get_profile("ghost").await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_leaderboard_orders_and_hides() {
        let env = TestEnvironment::new().await.unwrap();
        let service = service(&env);
        let alice = env.add_user("alice").await;
        let bob = env.add_user("bob").await;
        service.recompute(&alice.id).await.unwrap();
        service.recompute(&bob.id).await.unwrap();

        // Bob's history is entirely late returns; drive his score below 30
        for name in ["c", "d", "e", "f"] {
            let owner = env.add_user(name).await;
            let book = env.add_book(&owner, name).await;
            env.add_transaction(&book, &bob, TransactionStatus::Overdue, None, None)
                .await;
        }
        let result = service.recompute(&bob.id).await.unwrap();
        assert!(result.trust_score < 30.0);

        let board = service.leaderboard(None).await.unwrap();
        let names: Vec<&str> = board.iter().map(|s| s.user.username.as_str()).collect();
        assert!(names.contains(&"alice"));
        assert!(!names.contains(&"bob"));
    }

    #[tokio::test]
    async fn test_profile_includes_recent_ratings_with_rater_names() {
        let env = TestEnvironment::new().await.unwrap();
        let owner = env.add_user("owner").await;
        let requester = env.add_user("requester").await;
        let book = env.add_book(&owner, "Dune").await;
        let tx = env
            .add_transaction(&book, &requester, TransactionStatus::Completed, None, None)
            .await;
        rate(&env, &requester, &owner, &tx.id, 5).await;
        service(&env).recompute(&owner.id).await.unwrap();

        let profile = service(&env).get_profile(&owner.id).await.unwrap();
        assert_eq!(profile.recent_ratings.len(), 1);
        assert_eq!(
            profile.recent_ratings[0].rater_username.as_deref(),
            Some("requester")
        );
        assert_eq!(profile.user.total_ratings, 1);
        assert!(profile.badges.iter().all(|b| b.is_active));
    }
}
