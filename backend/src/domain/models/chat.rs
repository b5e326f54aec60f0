use chrono::{DateTime, Utc};

/// A conversation between two members about one book. `user1_id` is
/// whoever opened it; the room is the same whichever side asks for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRoom {
    pub id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub book_title: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl ChatRoom {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub chat_room_id: String,
    pub sender_id: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let now = Utc::now();
        let room = ChatRoom {
            id: ChatRoom::generate_id(),
            user1_id: "alice".to_string(),
            user2_id: "bob".to_string(),
            book_title: "Dune".to_string(),
            created_at: now,
            last_message_at: now,
        };
        assert!(room.is_member("alice"));
        assert!(room.is_member("bob"));
        assert!(!room.is_member("carol"));
    }
}
