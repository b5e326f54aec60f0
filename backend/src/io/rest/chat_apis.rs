//! # REST API for Chat
//!
//! Rooms are private to their two members; every route requires a token.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::domain::commands::chat::{OpenChatRoomCommand, SendMessageCommand};
use crate::io::rest::error::log_failure;
use crate::io::rest::extractors::{AppJson, AppPath, AuthUser};
use crate::io::rest::mappers::ChatMapper;
use crate::AppState;
use shared::{ChatRoomResponse, CreateChatRoomRequest, MessageResponse, SendMessageRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/:room_id", get(get_room).delete(delete_room))
        .route("/rooms/:room_id/messages", post(send_message))
}

/// Open a room with another member about a book, or return the existing one
pub async fn create_room(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<CreateChatRoomRequest>,
) -> impl IntoResponse {
    info!("POST /api/chat/rooms - request: {:?}", request);

    let command = OpenChatRoomCommand {
        actor_id: auth.user_id,
        other_user_id: request.other_user_id,
        book_title: request.book_title,
    };

    match state.chat_service.open_room(command).await {
        Ok(overview) => (
            StatusCode::CREATED,
            Json(ChatMapper::overview_to_dto(overview)),
        )
            .into_response(),
        Err(e) => {
            log_failure("open chat room", &e);
            e.into_response()
        }
    }
}

pub async fn list_rooms(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!("GET /api/chat/rooms - user: {}", auth.user_id);

    match state.chat_service.list_rooms(&auth.user_id).await {
        Ok(rooms) => {
            let body: Vec<ChatRoomResponse> =
                rooms.into_iter().map(ChatMapper::overview_to_dto).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log_failure("list chat rooms", &e);
            e.into_response()
        }
    }
}

pub async fn get_room(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(room_id): AppPath<String>,
) -> impl IntoResponse {
    info!("GET /api/chat/rooms/{}", room_id);

    match state.chat_service.get_room(&auth.user_id, &room_id).await {
        Ok(details) => (StatusCode::OK, Json(ChatMapper::details_to_dto(details))).into_response(),
        Err(e) => {
            log_failure("get chat room", &e);
            e.into_response()
        }
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(room_id): AppPath<String>,
    AppJson(request): AppJson<SendMessageRequest>,
) -> impl IntoResponse {
    info!("POST /api/chat/rooms/{}/messages", room_id);

    let command = SendMessageCommand {
        actor_id: auth.user_id,
        room_id,
        message: request.message,
    };

    match state.chat_service.send_message(command).await {
        Ok(message) => (StatusCode::CREATED, Json(ChatMapper::message_to_dto(message))).into_response(),
        Err(e) => {
            log_failure("send chat message", &e);
            e.into_response()
        }
    }
}

pub async fn delete_room(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(room_id): AppPath<String>,
) -> impl IntoResponse {
    info!("DELETE /api/chat/rooms/{}", room_id);

    match state.chat_service.delete_room(&auth.user_id, &room_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Chat room deleted successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            log_failure("delete chat room", &e);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtManager;
    use crate::storage::test_utils::TestEnvironment;

    #[tokio::test]
    async fn test_chat_handlers() {
        let env = TestEnvironment::new().await.unwrap();
        let alice = env.add_user("alice").await;
        let bob = env.add_user("bob").await;
        let mallory = env.add_user("mallory").await;
        let state = AppState::new(env.connection.clone(), JwtManager::new_dev(3600));
        let as_user = |user: &crate::domain::models::user::User| AuthUser {
            user_id: user.id.clone(),
            username: user.username.clone(),
        };

        let opened = create_room(
            State(state.clone()),
            as_user(&alice),
            AppJson(CreateChatRoomRequest {
                other_user_id: bob.id.clone(),
                book_title: "Dune".to_string(),
            }),
        )
        .await;
        assert_eq!(opened.into_response().status(), StatusCode::CREATED);
        let room_id = state.chat_service.list_rooms(&bob.id).await.unwrap()[0].room.id.clone();

        let sent = send_message(
            State(state.clone()),
            as_user(&bob),
            AppPath(room_id.clone()),
            AppJson(SendMessageRequest {
                message: "hi".to_string(),
            }),
        )
        .await;
        assert_eq!(sent.into_response().status(), StatusCode::CREATED);

        let denied = get_room(State(state.clone()), as_user(&mallory), AppPath(room_id.clone())).await;
        assert_eq!(denied.into_response().status(), StatusCode::FORBIDDEN);

        let deleted = delete_room(State(state.clone()), as_user(&alice), AppPath(room_id.clone())).await;
        assert_eq!(deleted.into_response().status(), StatusCode::OK);

        let gone = get_room(State(state), as_user(&alice), AppPath(room_id)).await;
        assert_eq!(gone.into_response().status(), StatusCode::NOT_FOUND);
    }
}
