use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl Book {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
