use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always "bearer"
    pub token_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Books
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub book_id: String,
    pub owner_id: String,
    /// One of "borrow", "swap", "buy", "rent"
    pub transaction_type: String,
    pub expected_return_date: Option<DateTime<Utc>>,
    /// Defaults to 0 when omitted
    pub security_deposit: Option<f64>,
    /// Defaults to 0 when omitted
    pub rental_fee: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTransactionStatusRequest {
    /// One of "pending", "active", "completed", "overdue", "cancelled"
    pub status: String,
    /// Only used when completing; defaults to now
    pub actual_return_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: String,
    pub book_id: String,
    pub owner_id: String,
    pub requester_id: String,
    pub transaction_type: String,
    pub status: String,
    pub start_date: Option<DateTime<Utc>>,
    pub expected_return_date: Option<DateTime<Utc>>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub security_deposit: f64,
    pub rental_fee: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Derived on read: active and past the expected return date
    pub is_overdue: bool,
    pub days_overdue: i64,
    pub book_title: Option<String>,
    pub book_author: Option<String>,
    pub owner_username: Option<String>,
    pub requester_username: Option<String>,
}

/// Compact row for transaction lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub id: String,
    pub book_title: String,
    pub other_user_username: String,
    pub transaction_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expected_return_date: Option<DateTime<Utc>>,
    pub is_overdue: bool,
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRatingRequest {
    pub transaction_id: String,
    pub rated_user_id: String,
    /// Integer score 1-5
    pub rating: i64,
    pub review_text: Option<String>,
    /// One of "borrower", "lender", "buyer", "seller"
    pub rating_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingResponse {
    pub id: String,
    pub rater_id: String,
    pub rated_user_id: String,
    pub transaction_id: String,
    pub rating: i64,
    pub review_text: Option<String>,
    pub rating_type: String,
    pub created_at: DateTime<Utc>,
    pub rater_username: Option<String>,
}

/// Reminder for a completed transaction the caller has not rated yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRatingResponse {
    pub transaction_id: String,
    pub other_user_id: String,
    pub other_user_username: String,
    pub book_title: String,
    pub transaction_type: String,
    pub completed_date: DateTime<Utc>,
    pub rating_type: String,
}

// ---------------------------------------------------------------------------
// Trust
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustBadgeResponse {
    pub id: String,
    pub badge_type: String,
    pub earned_date: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustProfileResponse {
    pub user_id: String,
    pub username: String,
    pub average_rating: f64,
    pub total_ratings: u32,
    pub total_transactions: u32,
    pub successful_transactions: u32,
    pub late_returns: u32,
    pub trust_score: f64,
    pub trust_level: String,
    pub is_profile_hidden: bool,
    pub badges: Vec<TrustBadgeResponse>,
    pub recent_ratings: Vec<RatingResponse>,
}

/// Lightweight trust info for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTrustSummary {
    pub user_id: String,
    pub username: String,
    pub average_rating: f64,
    pub total_ratings: u32,
    pub trust_score: f64,
    pub trust_level: String,
    /// Active badge types only
    pub badges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeInfoResponse {
    pub label: String,
    pub icon: String,
    pub color: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustLevelInfoResponse {
    pub level: String,
    pub label: String,
    pub color: String,
    pub icon: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustScoreUpdateResponse {
    pub message: String,
    pub new_trust_score: f64,
    pub badges: Vec<String>,
}

/// Plain acknowledgement body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Book search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSearchQuery {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSearchQuery {
    pub book_title: String,
}

/// A catalog volume, with how many other members in the caller's city own it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogBookResponse {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub published_date: String,
    pub description: String,
    pub thumbnail: String,
    pub isbn: Option<String>,
    pub average_rating: f64,
    pub ratings_count: u32,
    pub categories: Vec<String>,
    pub relevance_score: f64,
    pub available_in_city: bool,
    pub local_owners_count: u32,
}

// ---------------------------------------------------------------------------
// Book requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookRequestRequest {
    pub book_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapMatchResponse {
    pub matched_with: String,
    pub has_your_book: String,
    pub wants_your_book: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRequestResponse {
    pub id: String,
    pub book_title: String,
    pub user_id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    /// Swap partners found when the request was made; empty on listings
    pub matches: Vec<SwapMatchResponse>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChatRoomRequest {
    pub other_user_id: String,
    pub book_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    pub id: String,
    pub chat_room_id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRoomResponse {
    pub id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub user1_username: String,
    pub user2_username: String,
    pub book_title: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub last_message: Option<String>,
    pub unread_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRoomWithMessagesResponse {
    pub id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub user1_username: String,
    pub user2_username: String,
    pub book_title: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub messages: Vec<ChatMessageResponse>,
}
