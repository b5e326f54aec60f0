//! Trust score and badge rules.
//!
//! Everything here is pure: the same aggregate always produces the same score,
//! and nothing is carried between calls. The trust service gathers the inputs
//! from storage and persists the outputs.
//!
//! ## Score components
//!
//! | component    | with history                                        | no history |
//! |--------------|-----------------------------------------------------|------------|
//! | rating       | `avg/5*40 + min(5, ratings*0.5)`                    | 20         |
//! | success      | `successful/total*30`, `*0.8` below 3 transactions  | 15         |
//! | punctuality  | `max(0, 20 - late/total*40)`                        | 10         |
//! | activity     | `min(10, total*0.5)`                                | 0          |
//!
//! The rating component can reach 45 with a perfect average and ten or more
//! ratings; the final score is clamped to `[0, 100]` after summing.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::domain::models::{
    badge::BadgeType,
    rating::{Rating, RatingRole},
    transaction::{Transaction, TransactionStatus},
};

pub const MAX_TRUST_SCORE: f64 = 100.0;

const RATING_WEIGHT: f64 = 40.0;
const RATING_NEUTRAL: f64 = 20.0;
const RATING_VOLUME_BONUS_CAP: f64 = 5.0;
const RATING_VOLUME_BONUS_PER_RATING: f64 = 0.5;

const SUCCESS_WEIGHT: f64 = 30.0;
const SUCCESS_NEUTRAL: f64 = 15.0;
const SUCCESS_FEW_TRANSACTIONS: u32 = 3;
const SUCCESS_FEW_TRANSACTIONS_FACTOR: f64 = 0.8;

const PUNCTUALITY_WEIGHT: f64 = 20.0;
const PUNCTUALITY_NEUTRAL: f64 = 10.0;
const PUNCTUALITY_LATE_PENALTY: f64 = 40.0;

const ACTIVITY_CAP: f64 = 10.0;
const ACTIVITY_PER_TRANSACTION: f64 = 0.5;

const HIDE_SCORE_THRESHOLD: f64 = 30.0;
const HIDE_RATED_SCORE_THRESHOLD: f64 = 40.0;
const HIDE_RATED_MIN_RATINGS: u32 = 5;

/// Counters the score is derived from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrustAggregate {
    pub average_rating: f64,
    pub total_ratings: u32,
    pub total_transactions: u32,
    pub successful_transactions: u32,
    pub late_returns: u32,
}

impl TrustAggregate {
    /// Rebuild the counters from a user's full history
    pub fn from_history(ratings_received: &[Rating], transactions: &[Transaction]) -> Self {
        let total_ratings = ratings_received.len() as u32;
        let average_rating = if total_ratings > 0 {
            let sum: u32 = ratings_received.iter().map(|r| r.score as u32).sum();
            sum as f64 / total_ratings as f64
        } else {
            0.0
        };

        Self {
            average_rating,
            total_ratings,
            total_transactions: transactions.len() as u32,
            successful_transactions: transactions
                .iter()
                .filter(|t| t.status == TransactionStatus::Completed)
                .count() as u32,
            late_returns: transactions.iter().filter(|t| t.was_returned_late()).count() as u32,
        }
    }
}

/// Individual contributions, exposed so callers can explain a score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub rating: f64,
    pub transaction_success: f64,
    pub punctuality: f64,
    pub activity: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        let sum = self.rating + self.transaction_success + self.punctuality + self.activity;
        sum.clamp(0.0, MAX_TRUST_SCORE)
    }
}

pub fn score_breakdown(aggregate: &TrustAggregate) -> ScoreBreakdown {
    let rating = if aggregate.total_ratings > 0 {
        let volume_bonus = (aggregate.total_ratings as f64 * RATING_VOLUME_BONUS_PER_RATING)
            .min(RATING_VOLUME_BONUS_CAP);
        (aggregate.average_rating / 5.0) * RATING_WEIGHT + volume_bonus
    } else {
        RATING_NEUTRAL
    };

    let (transaction_success, punctuality) = if aggregate.total_transactions > 0 {
        let total = aggregate.total_transactions as f64;

        let mut success = (aggregate.successful_transactions as f64 / total) * SUCCESS_WEIGHT;
        if aggregate.total_transactions < SUCCESS_FEW_TRANSACTIONS {
            success *= SUCCESS_FEW_TRANSACTIONS_FACTOR;
        }

        let late_rate = aggregate.late_returns as f64 / total;
        let punctuality = (PUNCTUALITY_WEIGHT - late_rate * PUNCTUALITY_LATE_PENALTY).max(0.0);

        (success, punctuality)
    } else {
        (SUCCESS_NEUTRAL, PUNCTUALITY_NEUTRAL)
    };

    let activity =
        (aggregate.total_transactions as f64 * ACTIVITY_PER_TRANSACTION).min(ACTIVITY_CAP);

    ScoreBreakdown {
        rating,
        transaction_success,
        punctuality,
        activity,
    }
}

/// Trust score in `[0, 100]`
pub fn trust_score(aggregate: &TrustAggregate) -> f64 {
    score_breakdown(aggregate).total()
}

/// Hide from search/leaderboards when the score is very low, or low despite a rating history.
pub fn should_hide_profile(trust_score: f64, total_ratings: u32) -> bool {
    if trust_score < HIDE_SCORE_THRESHOLD {
        return true;
    }
    total_ratings >= HIDE_RATED_MIN_RATINGS && trust_score < HIDE_RATED_SCORE_THRESHOLD
}

/// Facts about the member that are not part of the aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct MemberFacts {
    pub joined_at: DateTime<Utc>,
    pub has_email: bool,
    pub books_listed: u32,
}

/// Badge set the member qualifies for right now
pub fn determine_badges(
    member: &MemberFacts,
    aggregate: &TrustAggregate,
    ratings_received: &[Rating],
    now: DateTime<Utc>,
) -> BTreeSet<BadgeType> {
    let mut badges = BTreeSet::new();
    let total = aggregate.total_transactions;

    if aggregate.average_rating >= 4.5 && total >= 10 {
        badges.insert(BadgeType::Reliable);
    }

    if total >= 5 {
        let on_time = total.saturating_sub(aggregate.late_returns);
        if on_time as f64 / total as f64 >= 0.9 {
            badges.insert(BadgeType::QuickReturner);
        }
    }

    let days_since_joined = (now - member.joined_at).num_days();
    if days_since_joined <= 30 && total < 3 {
        badges.insert(BadgeType::NewUser);
    }

    if member.has_email {
        badges.insert(BadgeType::Verified);
    }

    if member.books_listed >= 20 {
        badges.insert(BadgeType::BookCurator);
    }

    if total >= 50 {
        badges.insert(BadgeType::ActiveMember);
    }

    let lender_scores: Vec<u32> = ratings_received
        .iter()
        .filter(|r| r.role == RatingRole::Lender)
        .map(|r| r.score as u32)
        .collect();
    if lender_scores.len() >= 15 {
        let mean = lender_scores.iter().sum::<u32>() as f64 / lender_scores.len() as f64;
        if mean >= 4.8 {
            badges.insert(BadgeType::TrustedLender);
        }
    }

    badges
}
