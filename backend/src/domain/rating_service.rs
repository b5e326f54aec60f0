//! Rating store: one rating per party per completed transaction.
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::{
    commands::ratings::SubmitRatingCommand,
    error::{DomainError, DomainResult},
    models::{
        rating::{PendingRating, Rating, RatingRole, RatingView},
        transaction::{Transaction, TransactionStatus},
    },
    trust_service::TrustService,
};
use crate::storage::{
    BookStorage, Connection, PartySide, RatingStorage, TransactionStorage, UserStorage,
};

pub const DEFAULT_RATINGS_LIMIT: u32 = 20;
pub const MAX_RATINGS_LIMIT: u32 = 100;

/// Resolve each rating's rater to a username, looking every rater up once
pub async fn attach_rater_names<U: UserStorage>(
    users: &U,
    ratings: Vec<Rating>,
) -> DomainResult<Vec<RatingView>> {
    let mut names: HashMap<String, Option<String>> = HashMap::new();
    for rating in &ratings {
        if !names.contains_key(&rating.rater_id) {
            let username = users.get_user(&rating.rater_id).await?.map(|u| u.username);
            names.insert(rating.rater_id.clone(), username);
        }
    }

    Ok(ratings
        .into_iter()
        .map(|rating| {
            let rater_username = names.get(&rating.rater_id).cloned().flatten();
            RatingView {
                rating,
                rater_username,
            }
        })
        .collect())
}

#[derive(Clone)]
pub struct RatingService<C: Connection> {
    rating_repository: C::RatingRepository,
    transaction_repository: C::TransactionRepository,
    user_repository: C::UserRepository,
    book_repository: C::BookRepository,
    trust_service: TrustService<C>,
}

impl<C: Connection> RatingService<C> {
    pub fn new(connection: Arc<C>, trust_service: TrustService<C>) -> Self {
        Self {
            rating_repository: connection.create_rating_repository(),
            transaction_repository: connection.create_transaction_repository(),
            user_repository: connection.create_user_repository(),
            book_repository: connection.create_book_repository(),
            trust_service,
        }
    }

    /// Record `command.rater_id`'s rating of the other party, then rescore the rated user.
    pub async fn submit(&self, command: SubmitRatingCommand) -> DomainResult<Rating> {
        let score = Rating::validate_score(command.score)?;
        let role: RatingRole = command.role.parse()?;

        let transaction = self.require_transaction(&command.transaction_id).await?;

        let counterparty = transaction
            .counterparty_of(&command.rater_id)
            .ok_or_else(|| DomainError::permission("You are not a party to this transaction"))?;
        if counterparty != command.rated_user_id {
            return Err(DomainError::validation(
                "You can only rate the other party of the transaction",
            ));
        }

        if self
            .rating_repository
            .find_by_rater_and_transaction(&command.rater_id, &transaction.id)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict("You have already rated this transaction"));
        }

        if transaction.status != TransactionStatus::Completed {
            return Err(DomainError::validation(
                "Can only rate completed transactions",
            ));
        }

        let rating = Rating {
            id: Rating::generate_id(),
            rater_id: command.rater_id,
            rated_user_id: command.rated_user_id,
            transaction_id: transaction.id.clone(),
            score,
            review_text: command.review_text.filter(|t| !t.trim().is_empty()),
            role,
            created_at: Utc::now(),
        };
        // The unique index still catches a concurrent duplicate
        self.rating_repository.store_rating(&rating).await?;

        info!(
            "Stored rating {} of {} for user {} on transaction {}",
            rating.id, rating.score, rating.rated_user_id, rating.transaction_id
        );

        self.trust_service
            .recompute_after_change(&rating.rated_user_id)
            .await;

        Ok(rating)
    }

    /// Ratings received by `user_id`, newest first
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> DomainResult<Vec<RatingView>> {
        let limit = limit
            .unwrap_or(DEFAULT_RATINGS_LIMIT)
            .clamp(1, MAX_RATINGS_LIMIT);
        let ratings = self
            .rating_repository
            .list_received(user_id, Some(limit))
            .await?;
        attach_rater_names(&self.user_repository, ratings).await
    }

    /// Ratings left on one transaction; visible to its parties only
    pub async fn list_for_transaction(
        &self,
        actor_id: &str,
        transaction_id: &str,
    ) -> DomainResult<Vec<RatingView>> {
        let transaction = self.require_transaction(transaction_id).await?;
        if !transaction.is_party(actor_id) {
            return Err(DomainError::permission(
                "You are not a party to this transaction",
            ));
        }

        let ratings = self
            .rating_repository
            .list_for_transaction(transaction_id)
            .await?;
        attach_rater_names(&self.user_repository, ratings).await
    }

    /// Completed transactions `user_id` has not rated yet
    pub async fn list_pending(&self, user_id: &str) -> DomainResult<Vec<PendingRating>> {
        let completed = self
            .transaction_repository
            .list_for_user(user_id, PartySide::Either, Some(TransactionStatus::Completed))
            .await?;
        let already_rated = self.rating_repository.rated_transaction_ids(user_id).await?;

        let mut pending = Vec::new();
        for transaction in completed {
            if already_rated.contains(&transaction.id) {
                continue;
            }
            let Some(other_id) = transaction.counterparty_of(user_id) else {
                continue;
            };

            let other_user_username = self
                .user_repository
                .get_user(other_id)
                .await?
                .map(|u| u.username)
                .unwrap_or_default();
            let book_title = self
                .book_repository
                .get_book(&transaction.book_id)
                .await?
                .map(|b| b.title)
                .unwrap_or_default();

            // Requesters rate as borrowers, owners as lenders
            let role = if transaction.requester_id == user_id {
                RatingRole::Borrower
            } else {
                RatingRole::Lender
            };

            pending.push(PendingRating {
                transaction_id: transaction.id.clone(),
                other_user_id: other_id.to_string(),
                other_user_username,
                book_title,
                transaction_type: transaction.transaction_type,
                completed_date: transaction.actual_return_date.unwrap_or(transaction.updated_at),
                role,
            });
        }

        Ok(pending)
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
