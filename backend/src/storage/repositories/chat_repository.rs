use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::chat::{ChatMessage, ChatRoom};
use crate::storage::connection::DbConnection;
use crate::storage::traits::ChatStorage;

/// Repository for chat rooms and the messages posted in them
#[derive(Clone)]
pub struct ChatRepository {
    db: DbConnection,
}

impl ChatRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn room_from_row(row: &SqliteRow) -> DomainResult<ChatRoom> {
        Ok(ChatRoom {
            id: row.try_get("id")?,
            user1_id: row.try_get("user1_id")?,
            user2_id: row.try_get("user2_id")?,
            book_title: row.try_get("book_title")?,
            created_at: row.try_get("created_at")?,
            last_message_at: row.try_get("last_message_at")?,
        })
    }

    fn message_from_row(row: &SqliteRow) -> DomainResult<ChatMessage> {
        Ok(ChatMessage {
            id: row.try_get("id")?,
            chat_room_id: row.try_get("chat_room_id")?,
            sender_id: row.try_get("sender_id")?,
            message: row.try_get("message")?,
            is_read: row.try_get("is_read")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ChatStorage for ChatRepository {
    async fn store_room(&self, room: &ChatRoom) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_rooms (id, user1_id, user2_id, book_title, created_at, last_message_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&room.id)
        .bind(&room.user1_id)
        .bind(&room.user2_id)
        .bind(&room.book_title)
        .bind(room.created_at)
        .bind(room.last_message_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| DomainError::from_insert(e, "Chat room already exists"))?;
        Ok(())
    }

    async fn get_room(&self, room_id: &str) -> DomainResult<Option<ChatRoom>> {
        let row = sqlx::query(
            r#"
            SELECT id, user1_id, user2_id, book_title, created_at, last_message_at
            FROM chat_rooms
            WHERE id = ?
            "#,
        )
        .bind(room_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::room_from_row).transpose()
    }

    async fn find_room(
        &self,
        user_a: &str,
        user_b: &str,
        book_title: &str,
    ) -> DomainResult<Option<ChatRoom>> {
        let row = sqlx::query(
            r#"
            SELECT id, user1_id, user2_id, book_title, created_at, last_message_at
            FROM chat_rooms
            WHERE book_title = ?
              AND ((user1_id = ? AND user2_id = ?) OR (user1_id = ? AND user2_id = ?))
            "#,
        )
        .bind(book_title)
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::room_from_row).transpose()
    }

    async fn list_rooms_for_user(&self, user_id: &str) -> DomainResult<Vec<ChatRoom>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user1_id, user2_id, book_title, created_at, last_message_at
            FROM chat_rooms
            WHERE user1_id = ? OR user2_id = ?
            ORDER BY last_message_at DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::room_from_row).collect()
    }

    async fn append_message(&self, message: &ChatMessage) -> DomainResult<()> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, chat_room_id, sender_id, message, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.chat_room_id)
        .bind(&message.sender_id)
        .bind(&message.message)
        .bind(message.is_read)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("UPDATE chat_rooms SET last_message_at = ? WHERE id = ?")
            .bind(message.created_at)
            .bind(&message.chat_room_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Chat room not found"));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_messages(&self, room_id: &str) -> DomainResult<Vec<ChatMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, chat_room_id, sender_id, message, is_read, created_at
            FROM chat_messages
            WHERE chat_room_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::message_from_row).collect()
    }

    async fn last_message(&self, room_id: &str) -> DomainResult<Option<ChatMessage>> {
        let row = sqlx::query(
            r#"
            SELECT id, chat_room_id, sender_id, message, is_read, created_at
            FROM chat_messages
            WHERE chat_room_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(room_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::message_from_row).transpose()
    }

    async fn count_unread(&self, room_id: &str, reader_id: &str) -> DomainResult<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM chat_messages
            WHERE chat_room_id = ? AND sender_id != ? AND is_read = FALSE
            "#,
        )
        .bind(room_id)
        .bind(reader_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count as u32)
    }

    async fn mark_read(&self, room_id: &str, reader_id: &str) -> DomainResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE chat_messages SET is_read = TRUE
            WHERE chat_room_id = ? AND sender_id != ? AND is_read = FALSE
            "#,
        )
        .bind(room_id)
        .bind(reader_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_room(&self, room_id: &str) -> DomainResult<bool> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM chat_messages WHERE chat_room_id = ?")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM chat_rooms WHERE id = ?")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
