use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;
use crate::domain::models::transaction::TransactionType;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Capacity in which the rated user took part in the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingRole {
    Borrower,
    Lender,
    Buyer,
    Seller,
}

impl RatingRole {
    pub fn as_str(self) -> &'static str {
        match self {
            RatingRole::Borrower => "borrower",
            RatingRole::Lender => "lender",
            RatingRole::Buyer => "buyer",
            RatingRole::Seller => "seller",
        }
    }
}

impl FromStr for RatingRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrower" => Ok(RatingRole::Borrower),
            "lender" => Ok(RatingRole::Lender),
            "buyer" => Ok(RatingRole::Buyer),
            "seller" => Ok(RatingRole::Seller),
            other => Err(DomainError::validation(format!(
                "Rating type must be one of: borrower, lender, buyer, seller (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for RatingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 1-5 review left by one party about the other. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub id: String,
    pub rater_id: String,
    pub rated_user_id: String,
    pub transaction_id: String,
    pub score: u8,
    pub review_text: Option<String>,
    pub role: RatingRole,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn validate_score(score: i64) -> Result<u8, DomainError> {
        if (MIN_RATING..=MAX_RATING).contains(&score) {
            Ok(score as u8)
        } else {
            Err(DomainError::validation(format!(
                "Rating must be between {} and {} (got {})",
                MIN_RATING, MAX_RATING, score
            )))
        }
    }
}

/// Rating with the rater's username resolved, for display
#[derive(Debug, Clone, PartialEq)]
pub struct RatingView {
    pub rating: Rating,
    pub rater_username: Option<String>,
}

/// Completed transaction still waiting for the user's rating
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRating {
    pub transaction_id: String,
    pub other_user_id: String,
    pub other_user_username: String,
    pub book_title: String,
    pub transaction_type: TransactionType,
    pub completed_date: DateTime<Utc>,
    pub role: RatingRole,
}
