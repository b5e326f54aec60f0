//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the DTOs from the `shared`
//! crate onto these, adding the authenticated actor.

pub mod accounts {
    #[derive(Debug, Clone)]
    pub struct SignupCommand {
        pub username: String,
        pub email: Option<String>,
        pub password: String,
        pub city: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct LoginCommand {
        pub username: String,
        pub password: String,
    }
}

pub mod books {
    #[derive(Debug, Clone)]
    pub struct CreateBookCommand {
        pub owner_id: String,
        pub title: String,
        pub author: Option<String>,
    }
}

pub mod transactions {
    use chrono::{DateTime, Utc};

    use crate::domain::models::{book::Book, transaction::Transaction, user::User};

    /// Request from `requester_id` to take part in an agreement over a book.
    /// Type and money are unvalidated here; the ledger checks them.
    #[derive(Debug, Clone)]
    pub struct CreateTransactionCommand {
        pub requester_id: String,
        pub book_id: String,
        pub owner_id: String,
        pub transaction_type: String,
        pub expected_return_date: Option<DateTime<Utc>>,
        pub security_deposit: Option<f64>,
        pub rental_fee: Option<f64>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateTransactionStatusCommand {
        pub actor_id: String,
        pub transaction_id: String,
        pub new_status: String,
        pub actual_return_date: Option<DateTime<Utc>>,
        pub notes: Option<String>,
    }

    /// Query parameters for listing a user's transactions.
    #[derive(Debug, Clone, Default)]
    pub struct TransactionListQuery {
        pub status: Option<String>,
    }

    /// Transaction with its book and both parties resolved
    #[derive(Debug, Clone)]
    pub struct TransactionDetails {
        pub transaction: Transaction,
        pub book: Option<Book>,
        pub owner: Option<User>,
        pub requester: Option<User>,
    }

    impl TransactionDetails {
        /// Username of whichever party `viewer_id` is not
        pub fn other_username(&self, viewer_id: &str) -> Option<&str> {
            let other = if self.transaction.owner_id == viewer_id {
                &self.requester
            } else {
                &self.owner
            };
            other.as_ref().map(|u| u.username.as_str())
        }
    }
}

pub mod ratings {
    #[derive(Debug, Clone)]
    pub struct SubmitRatingCommand {
        pub rater_id: String,
        pub transaction_id: String,
        pub rated_user_id: String,
        pub score: i64,
        pub role: String,
        pub review_text: Option<String>,
    }
}

pub mod trust {
    use std::collections::BTreeSet;

    use crate::domain::models::{badge::BadgeType, badge::TrustBadge, rating::RatingView, user::User};
    use crate::domain::trust_scoring::TrustAggregate;

    /// Everything the recompute writes, applied atomically by storage
    #[derive(Debug, Clone)]
    pub struct TrustUpdate {
        pub user_id: String,
        pub aggregate: TrustAggregate,
        pub trust_score: f64,
        pub is_profile_hidden: bool,
        pub badges: BTreeSet<BadgeType>,
    }

    /// Result of recomputing a user's trust data
    #[derive(Debug, Clone)]
    pub struct TrustRecomputeResult {
        pub trust_score: f64,
        pub badges: BTreeSet<BadgeType>,
    }

    #[derive(Debug, Clone)]
    pub struct TrustProfile {
        pub user: User,
        pub badges: Vec<TrustBadge>,
        pub recent_ratings: Vec<RatingView>,
    }

    #[derive(Debug, Clone)]
    pub struct TrustSummary {
        pub user: User,
        pub active_badges: Vec<String>,
    }
}

pub mod chat {
    use crate::domain::models::chat::{ChatMessage, ChatRoom};

    #[derive(Debug, Clone)]
    pub struct OpenChatRoomCommand {
        pub actor_id: String,
        pub other_user_id: String,
        pub book_title: String,
    }

    #[derive(Debug, Clone)]
    pub struct SendMessageCommand {
        pub actor_id: String,
        pub room_id: String,
        pub message: String,
    }

    /// A room as it appears in the member's inbox
    #[derive(Debug, Clone)]
    pub struct ChatRoomOverview {
        pub room: ChatRoom,
        pub user1_username: Option<String>,
        pub user2_username: Option<String>,
        pub last_message: Option<String>,
        pub unread_count: u32,
    }

    #[derive(Debug, Clone)]
    pub struct ChatMessageView {
        pub message: ChatMessage,
        pub sender_username: Option<String>,
    }

    /// A room with its full history, oldest message first
    #[derive(Debug, Clone)]
    pub struct ChatRoomDetails {
        pub room: ChatRoom,
        pub user1_username: Option<String>,
        pub user2_username: Option<String>,
        pub messages: Vec<ChatMessageView>,
    }
}

pub mod requests {
    use crate::domain::models::book_request::{BookRequest, SwapMatch};

    #[derive(Debug, Clone)]
    pub struct CreateBookRequestCommand {
        pub user_id: String,
        pub book_title: String,
    }

    /// The stored request plus any swap partners found in the requester's city
    #[derive(Debug, Clone)]
    pub struct BookRequestOutcome {
        pub request: BookRequest,
        pub username: String,
        pub matches: Vec<SwapMatch>,
    }
}
