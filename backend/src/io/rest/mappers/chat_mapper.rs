use crate::domain::commands::chat::{ChatMessageView, ChatRoomDetails, ChatRoomOverview};
use shared::{ChatMessageResponse, ChatRoomResponse, ChatRoomWithMessagesResponse};

pub struct ChatMapper;

fn name_or_unknown(name: Option<String>) -> String {
    name.unwrap_or_else(|| "Unknown".to_string())
}

impl ChatMapper {
    pub fn overview_to_dto(overview: ChatRoomOverview) -> ChatRoomResponse {
        let room = overview.room;
        ChatRoomResponse {
            id: room.id,
            user1_id: room.user1_id,
            user2_id: room.user2_id,
            user1_username: name_or_unknown(overview.user1_username),
            user2_username: name_or_unknown(overview.user2_username),
            book_title: room.book_title,
            created_at: room.created_at,
            last_message_at: room.last_message_at,
            last_message: overview.last_message,
            unread_count: overview.unread_count,
        }
    }

    pub fn message_to_dto(view: ChatMessageView) -> ChatMessageResponse {
        let message = view.message;
        ChatMessageResponse {
            id: message.id,
            chat_room_id: message.chat_room_id,
            sender_id: message.sender_id,
            sender_username: name_or_unknown(view.sender_username),
            message: message.message,
            is_read: message.is_read,
            created_at: message.created_at,
        }
    }

    pub fn details_to_dto(details: ChatRoomDetails) -> ChatRoomWithMessagesResponse {
        let room = details.room;
        ChatRoomWithMessagesResponse {
            id: room.id,
            user1_id: room.user1_id,
            user2_id: room.user2_id,
            user1_username: name_or_unknown(details.user1_username),
            user2_username: name_or_unknown(details.user2_username),
            book_title: room.book_title,
            created_at: room.created_at,
            last_message_at: room.last_message_at,
            messages: details.messages.into_iter().map(Self::message_to_dto).collect(),
        }
    }
}
