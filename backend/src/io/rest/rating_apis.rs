//! # REST API for Ratings

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::commands::ratings::SubmitRatingCommand;
use crate::io::rest::error::log_failure;
use crate::io::rest::extractors::{AppJson, AppPath, AppQuery, AuthUser};
use crate::io::rest::mappers::RatingMapper;
use crate::AppState;
use shared::{CreateRatingRequest, PendingRatingResponse, RatingResponse};

#[derive(Debug, Deserialize)]
pub struct RatingListQuery {
    pub limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_rating))
        .route("/pending", get(pending_ratings))
        .route("/user/:user_id", get(user_ratings))
        .route("/transaction/:transaction_id", get(transaction_ratings))
}

/// Rate the other party of a completed transaction
pub async fn create_rating(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<CreateRatingRequest>,
) -> impl IntoResponse {
    info!("POST /api/ratings - request: {:?}", request);

    let command = SubmitRatingCommand {
        rater_id: auth.user_id,
        transaction_id: request.transaction_id,
        rated_user_id: request.rated_user_id,
        score: request.rating,
        role: request.rating_type,
        review_text: request.review_text,
    };

    match state.rating_service.submit(command).await {
        Ok(rating) => (
            StatusCode::CREATED,
            Json(RatingMapper::submitted_to_dto(rating, auth.username)),
        )
            .into_response(),
        Err(e) => {
            log_failure("submit rating", &e);
            e.into_response()
        }
    }
}

/// Ratings a user has received, newest first. Public.
pub async fn user_ratings(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<String>,
    AppQuery(query): AppQuery<RatingListQuery>,
) -> impl IntoResponse {
    info!("GET /api/ratings/user/{} - query: {:?}", user_id, query);

    match state.rating_service.list_for_user(&user_id, query.limit).await {
        Ok(views) => {
            let body: Vec<RatingResponse> = views.into_iter().map(RatingMapper::to_dto).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log_failure("list user ratings", &e);
            e.into_response()
        }
    }
}

pub async fn transaction_ratings(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(transaction_id): AppPath<String>,
) -> impl IntoResponse {
    info!("GET /api/ratings/transaction/{}", transaction_id);

    match state
        .rating_service
        .list_for_transaction(&auth.user_id, &transaction_id)
        .await
    {
        Ok(views) => {
            let body: Vec<RatingResponse> = views.into_iter().map(RatingMapper::to_dto).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log_failure("list transaction ratings", &e);
            e.into_response()
        }
    }
}

/// Completed transactions the caller still has to rate
pub async fn pending_ratings(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!("GET /api/ratings/pending - user: {}", auth.username);

    match state.rating_service.list_pending(&auth.user_id).await {
        Ok(pending) => {
            let body: Vec<PendingRatingResponse> =
                pending.into_iter().map(RatingMapper::pending_to_dto).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log_failure("list pending ratings", &e);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtManager;
    use crate::domain::models::transaction::TransactionStatus;
    use crate::storage::test_utils::TestEnvironment;

    #[tokio::test]
    async fn test_create_rating_handler() {
        let env = TestEnvironment::new().await.unwrap();
        let owner = env.add_user("owner").await;
        let requester = env.add_user("requester").await;
        let book = env.add_book(&owner, "Dune").await;
        let tx = env
            .add_transaction(&book, &requester, TransactionStatus::Completed, None, None)
            .await;
        let state = AppState::new(env.connection.clone(), JwtManager::new_dev(3600));
        let auth = AuthUser {
            user_id: requester.id.clone(),
            username: requester.username.clone(),
        };

        let request = CreateRatingRequest {
            transaction_id: tx.id.clone(),
            rated_user_id: owner.id.clone(),
            rating: 5,
            review_text: None,
            rating_type: "lender".to_string(),
        };

        let created = create_rating(State(state.clone()), auth.clone(), AppJson(request.clone())).await;
        assert_eq!(created.into_response().status(), StatusCode::CREATED);

        let duplicate = create_rating(State(state.clone()), auth.clone(), AppJson(request)).await;
        assert_eq!(duplicate.into_response().status(), StatusCode::CONFLICT);

        let out_of_range = create_rating(
            State(state),
            auth,
            AppJson(CreateRatingRequest {
                transaction_id: tx.id,
                rated_user_id: owner.id,
                rating: 0,
                review_text: None,
                rating_type: "lender".to_string(),
            }),
        )
        .await;
        assert_eq!(out_of_range.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
