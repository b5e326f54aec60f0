//! Direct messages between two members about a book.
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::{
    commands::chat::{
        ChatMessageView, ChatRoomDetails, ChatRoomOverview, OpenChatRoomCommand,
        SendMessageCommand,
    },
    error::{DomainError, DomainResult},
    models::chat::{ChatMessage, ChatRoom},
};
use crate::storage::{ChatStorage, Connection, UserStorage};

#[derive(Clone)]
pub struct ChatService<C: Connection> {
    chat_repository: C::ChatRepository,
    user_repository: C::UserRepository,
}

impl<C: Connection> ChatService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            chat_repository: connection.create_chat_repository(),
            user_repository: connection.create_user_repository(),
        }
    }

    /// Return the room for this pair and title, creating it on first contact
    pub async fn open_room(&self, command: OpenChatRoomCommand) -> DomainResult<ChatRoomOverview> {
        let actor_id = command.actor_id.clone();
        let room = self.find_or_create_room(command).await?;
        self.overview(room, &actor_id, &mut UsernameCache::default()).await
    }

    async fn find_or_create_room(&self, command: OpenChatRoomCommand) -> DomainResult<ChatRoom> {
        let book_title = command.book_title.trim();
        if book_title.is_empty() {
            return Err(DomainError::validation("Book title is required"));
        }
        if command.actor_id == command.other_user_id {
            return Err(DomainError::validation("You cannot open a chat with yourself"));
        }

        if let Some(room) = self
            .chat_repository
            .find_room(&command.actor_id, &command.other_user_id, book_title)
            .await?
        {
            return Ok(room);
        }

        if self
            .user_repository
            .get_user(&command.other_user_id)
            .await?
            .is_none()
        {
            return Err(DomainError::not_found("User not found"));
        }

        let now = Utc::now();
        let room = ChatRoom {
            id: ChatRoom::generate_id(),
            user1_id: command.actor_id.clone(),
            user2_id: command.other_user_id.clone(),
            book_title: book_title.to_string(),
            created_at: now,
            last_message_at: now,
        };

        match self.chat_repository.store_room(&room).await {
            Ok(()) => {
                info!("Opened chat room {} about '{}'", room.id, room.book_title);
                Ok(room)
            }
            // The other side opened the same room concurrently
            Err(DomainError::Conflict(_)) => self
                .chat_repository
                .find_room(&command.actor_id, &command.other_user_id, book_title)
                .await?
                .ok_or_else(|| DomainError::Internal("Chat room vanished after conflict".to_string())),
            Err(e) => Err(e),
        }
    }

    /// The caller's rooms, most recently active first
    pub async fn list_rooms(&self, actor_id: &str) -> DomainResult<Vec<ChatRoomOverview>> {
        let rooms = self.chat_repository.list_rooms_for_user(actor_id).await?;
        let mut names = UsernameCache::default();

        let mut overviews = Vec::with_capacity(rooms.len());
        for room in rooms {
            overviews.push(self.overview(room, actor_id, &mut names).await?);
        }
        Ok(overviews)
    }

    async fn overview(
        &self,
        room: ChatRoom,
        reader_id: &str,
        names: &mut UsernameCache,
    ) -> DomainResult<ChatRoomOverview> {
        let last_message = self
            .chat_repository
            .last_message(&room.id)
            .await?
            .map(|m| m.message);
        let unread_count = self.chat_repository.count_unread(&room.id, reader_id).await?;
        let user1_username = names.lookup(&self.user_repository, &room.user1_id).await?;
        let user2_username = names.lookup(&self.user_repository, &room.user2_id).await?;

        Ok(ChatRoomOverview {
            room,
            user1_username,
            user2_username,
            last_message,
            unread_count,
        })
    }

    /// Full history of a room; reading it marks the other side's messages as read
    pub async fn get_room(&self, actor_id: &str, room_id: &str) -> DomainResult<ChatRoomDetails> {
        let room = self.require_member(actor_id, room_id).await?;

        let marked = self.chat_repository.mark_read(&room.id, actor_id).await?;
        if marked > 0 {
            info!("Marked {} messages read in room {}", marked, room.id);
        }

        let mut names = UsernameCache::default();
        let user1_username = names.lookup(&self.user_repository, &room.user1_id).await?;
        let user2_username = names.lookup(&self.user_repository, &room.user2_id).await?;

        let mut messages = Vec::new();
        for message in self.chat_repository.list_messages(&room.id).await? {
            let sender_username = names.lookup(&self.user_repository, &message.sender_id).await?;
            messages.push(ChatMessageView {
                message,
                sender_username,
            });
        }

        Ok(ChatRoomDetails {
            room,
            user1_username,
            user2_username,
            messages,
        })
    }

    pub async fn send_message(&self, command: SendMessageCommand) -> DomainResult<ChatMessageView> {
        let text = command.message.trim();
        if text.is_empty() {
            return Err(DomainError::validation("Message cannot be empty"));
        }

        let room = self.require_member(&command.actor_id, &command.room_id).await?;
        let message = ChatMessage {
            id: ChatMessage::generate_id(),
            chat_room_id: room.id.clone(),
            sender_id: command.actor_id.clone(),
            message: text.to_string(),
            is_read: false,
            created_at: Utc::now(),
        };
        self.chat_repository.append_message(&message).await?;

        let sender_username = self
            .user_repository
            .get_user(&command.actor_id)
            .await?
            .map(|u| u.username);
        Ok(ChatMessageView {
            message,
            sender_username,
        })
    }

    pub async fn delete_room(&self, actor_id: &str, room_id: &str) -> DomainResult<()> {
        let room = self.require_member(actor_id, room_id).await?;
        if !self.chat_repository.delete_room(&room.id).await? {
            return Err(DomainError::not_found("Chat room not found"));
        }
        info!("Deleted chat room {} at the request of {}", room.id, actor_id);
        Ok(())
    }

    async fn require_member(&self, actor_id: &str, room_id: &str) -> DomainResult<ChatRoom> {
        let room = self
            .chat_repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Chat room not found"))?;
        if !room.is_member(actor_id) {
            return Err(DomainError::permission("Access denied"));
        }
        Ok(room)
    }
}

/// Usernames looked up once per request
#[derive(Default)]
struct UsernameCache {
    names: HashMap<String, Option<String>>,
}

impl UsernameCache {
    async fn lookup<U: UserStorage>(&mut self, users: &U, user_id: &str) -> DomainResult<Option<String>> {
        if let Some(name) = self.names.get(user_id) {
            return Ok(name.clone());
        }
        let name = users.get_user(user_id).await?.map(|u| u.username);
        self.names.insert(user_id.to_string(), name.clone());
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::TestEnvironment;
    use crate::storage::DbConnection;

    fn service(env: &TestEnvironment) -> ChatService<DbConnection> {
        ChatService::new(Arc::new(env.connection.clone()))
    }

    fn open(actor: &str, other: &str, title: &str) -> OpenChatRoomCommand {
        OpenChatRoomCommand {
            actor_id: actor.to_string(),
            other_user_id: other.to_string(),
            book_title: title.to_string(),
        }
    }

    fn say(actor: &str, room: &str, text: &str) -> SendMessageCommand {
        SendMessageCommand {
            actor_id: actor.to_string(),
            room_id: room.to_string(),
            message: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_room_is_idempotent_from_either_side() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;
        let bob = env.add_user("bob").await;
        let service = service(&env);

        let first = service.open_room(open(&alice.id, &bob.id, " Dune ")).await.unwrap();
        assert_eq!(first.room.book_title, "Dune");
        assert_eq!(first.user1_username.as_deref(), Some("alice"));
        assert_eq!(first.user2_username.as_deref(), Some("bob"));
        let again = service.open_room(open(&bob.id, &alice.id, "Dune")).await.unwrap();
        assert_eq!(again.room.id, first.room.id);

        let other_book = service.open_room(open(&bob.id, &alice.id, "Emma")).await.unwrap();
        assert_ne!(other_book.room.id, first.room.id);
    }

    #[tokio::test]
    async fn test_open_room_validation() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;
        let bob = env.add_user("bob").await;
        let service = service(&env);

        assert!(matches!(
            service.open_room(open(&alice.id, &bob.id, "  ")).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.open_room(open(&alice.id, &alice.id, "Dune")).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.open_room(open(&alice.id, "ghost", "Dune")).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_conversation_and_read_tracking() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;
        let bob = env.add_user("bob").await;
        let service = service(&env);
        let room = service.open_room(open(&alice.id, &bob.id, "Dune")).await.unwrap().room;

        let sent = service.send_message(say(&alice.id, &room.id, "  still have it? ")).await.unwrap();
        assert_eq!(sent.message.message, "still have it?");
        assert_eq!(sent.sender_username.as_deref(), Some("alice"));
        service.send_message(say(&bob.id, &room.id, "yes")).await.unwrap();

        let inbox = service.list_rooms(&bob.id).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].unread_count, 1);
        assert_eq!(inbox[0].last_message.as_deref(), Some("yes"));
        assert_eq!(inbox[0].user1_username.as_deref(), Some("alice"));

        let details = service.get_room(&bob.id, &room.id).await.unwrap();
        let lines: Vec<(&str, &str)> = details
            .messages
            .iter()
            .map(|m| {
                (
                    m.sender_username.as_deref().unwrap_or("?"),
                    m.message.message.as_str(),
                )
            })
            .collect();
        assert_eq!(lines, vec![("alice", "still have it?"), ("bob", "yes")]);

        assert_eq!(service.list_rooms(&bob.id).await.unwrap()[0].unread_count, 0);
        assert_eq!(service.list_rooms(&alice.id).await.unwrap()[0].unread_count, 1);
    }

    #[tokio::test]
    async fn test_outsiders_are_denied() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;
        let bob = env.add_user("bob").await;
        let mallory = env.add_user("mallory").await;
        let service = service(&env);
        let room = service.open_room(open(&alice.id, &bob.id, "Dune")).await.unwrap().room;

        assert!(matches!(
            service.get_room(&mallory.id, &room.id).await,
            Err(DomainError::Permission(_))
        ));
        assert!(matches!(
            service.send_message(say(&mallory.id, &room.id, "hi")).await,
            Err(DomainError::Permission(_))
        ));
        assert!(matches!(
            service.delete_room(&mallory.id, &room.id).await,
            Err(DomainError::Permission(_))
        ));
        assert!(matches!(
            service.send_message(say(&alice.id, &room.id, "   ")).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.get_room(&alice.id, "missing").await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_room() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;
        let bob = env.add_user("bob").await;
        let service = service(&env);
        let room = service.open_room(open(&alice.id, &bob.id, "Dune")).await.unwrap().room;
        service.send_message(say(&bob.id, &room.id, "hi")).await.unwrap();

        service.delete_room(&bob.id, &room.id).await.unwrap();
        assert!(service.list_rooms(&alice.id).await.unwrap().is_empty());
        assert!(matches!(
            service.delete_room(&bob.id, &room.id).await,
            Err(DomainError::NotFound(_))
        ));
    }
}
