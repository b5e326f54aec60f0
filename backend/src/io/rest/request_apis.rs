//! # REST API for Book Requests

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::info;

use crate::domain::commands::requests::CreateBookRequestCommand;
use crate::io::rest::error::log_failure;
use crate::io::rest::extractors::{AppJson, AuthUser};
use crate::io::rest::mappers::RequestMapper;
use crate::AppState;
use shared::{BookRequestResponse, CreateBookRequestRequest};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_requests).post(create_request))
}

/// Ask for a title; the response carries any swap partners found in the caller's city
pub async fn create_request(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<CreateBookRequestRequest>,
) -> impl IntoResponse {
    info!("POST /api/requests - request: {:?}", request);

    let command = CreateBookRequestCommand {
        user_id: auth.user_id,
        book_title: request.book_title,
    };

    match state.request_service.create_request(command).await {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(RequestMapper::outcome_to_dto(outcome)),
        )
            .into_response(),
        Err(e) => {
            log_failure("create book request", &e);
            e.into_response()
        }
    }
}

pub async fn list_requests(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!("GET /api/requests - user: {}", auth.user_id);

    match state.request_service.list_requests(&auth.user_id).await {
        Ok(requests) => {
            let body: Vec<BookRequestResponse> = requests
                .into_iter()
                .map(|r| RequestMapper::to_dto(r, auth.username.clone(), Vec::new()))
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log_failure("list book requests", &e);
            e.into_response()
        }
    }
}
