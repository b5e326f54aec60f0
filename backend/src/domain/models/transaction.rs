//! Domain model for a lending agreement between two users over one book.
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Borrow,
    Swap,
    Buy,
    Rent,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Borrow => "borrow",
            TransactionType::Swap => "swap",
            TransactionType::Buy => "buy",
            TransactionType::Rent => "rent",
        }
    }
}

impl FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrow" => Ok(TransactionType::Borrow),
            "swap" => Ok(TransactionType::Swap),
            "buy" => Ok(TransactionType::Buy),
            "rent" => Ok(TransactionType::Rent),
            other => Err(DomainError::validation(format!(
                "Transaction type must be one of: borrow, swap, buy, rent (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a transaction. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    Pending,
    Active,
    Completed,
    Overdue,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Active => "active",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Overdue => "overdue",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    /// States reachable in one step from `self`
    pub fn allowed_transitions(self) -> &'static [TransactionStatus] {
        use TransactionStatus::*;
        match self {
            Pending => &[Active, Cancelled],
            Active => &[Completed, Overdue, Cancelled],
            Overdue => &[Completed, Cancelled],
            Completed => &[],
            Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Pending and active transactions hold the book; at most one per book.
    pub fn holds_book(self) -> bool {
        matches!(self, TransactionStatus::Pending | TransactionStatus::Active)
    }
}

impl FromStr for TransactionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "active" => Ok(TransactionStatus::Active),
            "completed" => Ok(TransactionStatus::Completed),
            "overdue" => Ok(TransactionStatus::Overdue),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "Status must be one of: pending, active, completed, overdue, cancelled (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub book_id: String,
    pub owner_id: String,
    pub requester_id: String,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub expected_return_date: Option<DateTime<Utc>>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub security_deposit: f64,
    pub rental_fee: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn is_party(&self, user_id: &str) -> bool {
        self.owner_id == user_id || self.requester_id == user_id
    }

    /// The other side of the agreement, or `None` if `user_id` is not a party
    pub fn counterparty_of(&self, user_id: &str) -> Option<&str> {
        if self.owner_id == user_id {
            Some(&self.requester_id)
        } else if self.requester_id == user_id {
            Some(&self.owner_id)
        } else {
            None
        }
    }

    /// Active and past its expected return date. Never persisted.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        match (self.status, self.expected_return_date) {
            (TransactionStatus::Active, Some(expected)) => now > expected,
            _ => false,
        }
    }

    pub fn days_overdue_at(&self, now: DateTime<Utc>) -> i64 {
        match self.expected_return_date {
            Some(expected) if self.is_overdue_at(now) => (now - expected).num_days(),
            _ => 0,
        }
    }

    /// Counts against the user's punctuality: flagged overdue, or returned after the due date.
    pub fn was_returned_late(&self) -> bool {
        if self.status == TransactionStatus::Overdue {
            return true;
        }
        match (self.actual_return_date, self.expected_return_date) {
            (Some(actual), Some(expected)) => actual > expected,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(status: TransactionStatus) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: "tx-1".to_string(),
            book_id: "book-1".to_string(),
            owner_id: "owner".to_string(),
            requester_id: "requester".to_string(),
            transaction_type: TransactionType::Borrow,
            status,
            start_date: None,
            expected_return_date: None,
            actual_return_date: None,
            security_deposit: 0.0,
            rental_fee: 0.0,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_transition_table() {
        use TransactionStatus::*;
        let all = [Pending, Active, Completed, Overdue, Cancelled];
        let allowed = [
            (Pending, Active),
            (Pending, Cancelled),
            (Active, Completed),
            (Active, Overdue),
            (Active, Cancelled),
            (Overdue, Completed),
            (Overdue, Cancelled),
        ];

        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Overdue.is_terminal());
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert!(matches!("lend".parse::<TransactionType>(), Err(DomainError::Validation(_))));
        assert!(matches!("returned".parse::<TransactionStatus>(), Err(DomainError::Validation(_))));
        assert_eq!("rent".parse::<TransactionType>().unwrap(), TransactionType::Rent);
        assert_eq!("overdue".parse::<TransactionStatus>().unwrap(), TransactionStatus::Overdue);
    }

    #[test]
    fn test_overdue_is_derived_from_active_and_due_date() {
        let now = Utc::now();
        let mut tx = sample(TransactionStatus::Active);
        tx.expected_return_date = Some(now - Duration::days(3) - Duration::hours(1));
        assert!(tx.is_overdue_at(now));
        assert_eq!(tx.days_overdue_at(now), 3);

        tx.status = TransactionStatus::Pending;
        assert!(!tx.is_overdue_at(now));
        assert_eq!(tx.days_overdue_at(now), 0);

        tx.status = TransactionStatus::Active;
        tx.expected_return_date = Some(now + Duration::days(1));
        assert!(!tx.is_overdue_at(now));
    }

    #[test]
    fn test_late_return_detection() {
        let now = Utc::now();
        let mut tx = sample(TransactionStatus::Completed);
        tx.expected_return_date = Some(now - Duration::days(2));
        tx.actual_return_date = Some(now);
        assert!(tx.was_returned_late());

        tx.actual_return_date = Some(now - Duration::days(5));
        assert!(!tx.was_returned_late());

        assert!(sample(TransactionStatus::Overdue).was_returned_late());
    }

    #[test]
    fn test_counterparty() {
        let tx = sample(TransactionStatus::Pending);
        assert_eq!(tx.counterparty_of("owner"), Some("requester"));
        assert_eq!(tx.counterparty_of("requester"), Some("owner"));
        assert_eq!(tx.counterparty_of("stranger"), None);
    }
}
