use chrono::{DateTime, Utc};

use crate::domain::commands::transactions::TransactionDetails;
use crate::domain::models::transaction::Transaction;
use shared::{TransactionResponse, TransactionSummary};

pub struct TransactionMapper;

impl TransactionMapper {
    /// Bare transaction, without the book and party names
    pub fn to_dto(domain: Transaction, now: DateTime<Utc>) -> TransactionResponse {
        Self::to_detailed_dto(
            TransactionDetails {
                transaction: domain,
                book: None,
                owner: None,
                requester: None,
            },
            now,
        )
    }

    pub fn to_detailed_dto(details: TransactionDetails, now: DateTime<Utc>) -> TransactionResponse {
        let tx = details.transaction;
        let is_overdue = tx.is_overdue_at(now);
        let days_overdue = tx.days_overdue_at(now);
        let (book_title, book_author) = match details.book {
            Some(book) => (Some(book.title), book.author),
            None => (None, None),
        };

        TransactionResponse {
            id: tx.id,
            book_id: tx.book_id,
            owner_id: tx.owner_id,
            requester_id: tx.requester_id,
            transaction_type: tx.transaction_type.as_str().to_string(),
            status: tx.status.as_str().to_string(),
            start_date: tx.start_date,
            expected_return_date: tx.expected_return_date,
            actual_return_date: tx.actual_return_date,
            security_deposit: tx.security_deposit,
            rental_fee: tx.rental_fee,
            notes: tx.notes,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
            is_overdue,
            days_overdue,
            book_title,
            book_author,
            owner_username: details.owner.map(|u| u.username),
            requester_username: details.requester.map(|u| u.username),
        }
    }

    /// List row as seen by `viewer_id`
    pub fn to_summary(
        details: &TransactionDetails,
        viewer_id: &str,
        now: DateTime<Utc>,
    ) -> TransactionSummary {
        let tx = &details.transaction;
        TransactionSummary {
            id: tx.id.clone(),
            book_title: details
                .book
                .as_ref()
                .map(|b| b.title.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            other_user_username: details
                .other_username(viewer_id)
                .unwrap_or("Unknown")
                .to_string(),
            transaction_type: tx.transaction_type.as_str().to_string(),
            status: tx.status.as_str().to_string(),
            created_at: tx.created_at,
            expected_return_date: tx.expected_return_date,
            is_overdue: tx.is_overdue_at(now),
        }
    }
}
