use chrono::{DateTime, Utc};

/// A title a member is looking for
#[derive(Debug, Clone, PartialEq)]
pub struct BookRequest {
    pub id: String,
    pub user_id: String,
    pub book_title: String,
    pub created_at: DateTime<Utc>,
}

impl BookRequest {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// A neighbour who owns the requested title and wants one of the
/// requester's books in return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapMatch {
    pub matched_with: String,
    pub has_your_book: String,
    pub wants_your_book: String,
}
