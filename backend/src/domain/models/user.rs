use chrono::{DateTime, Utc};

/// A registered member. The trust fields are a denormalised cache owned by
/// the trust recompute; nothing else writes them.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub average_rating: f64,
    pub total_ratings: u32,
    pub total_transactions: u32,
    pub successful_transactions: u32,
    pub late_returns: u32,
    pub trust_score: f64,
    pub is_profile_hidden: bool,
}

impl User {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn has_email(&self) -> bool {
        self.email.as_deref().map(|e| !e.trim().is_empty()).unwrap_or(false)
    }
}
