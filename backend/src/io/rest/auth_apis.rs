//! # REST API for Accounts
//!
//! Signup, login and the current-user lookup.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::domain::commands::accounts::{LoginCommand, SignupCommand};
use crate::io::rest::error::log_failure;
use crate::io::rest::extractors::{AppJson, AuthUser};
use crate::io::rest::mappers::UserMapper;
use crate::AppState;
use shared::{LoginRequest, SignupRequest, TokenResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

/// Register a new account
pub async fn signup(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignupRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/signup - username: {}", request.username);

    let command = SignupCommand {
        username: request.username,
        email: request.email,
        password: request.password,
        city: request.city,
    };

    match state.user_service.signup(command).await {
        Ok(user) => (StatusCode::CREATED, Json(UserMapper::to_dto(user))).into_response(),
        Err(e) => {
            log_failure("sign up", &e);
            e.into_response()
        }
    }
}

/// Exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/login - username: {}", request.username);

    let command = LoginCommand {
        username: request.username,
        password: request.password,
    };

    let result = match state.user_service.login(command).await {
        Ok(user) => state.jwt.issue(&user.id, &user.username),
        Err(e) => Err(e),
    };

    match result {
        Ok(access_token) => (
            StatusCode::OK,
            Json(TokenResponse {
                access_token,
                token_type: "bearer".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            log_failure("log in", &e);
            e.into_response()
        }
    }
}

/// The authenticated caller's account
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!("GET /api/auth/me - user: {}", auth.username);

    match state.user_service.get_user(&auth.user_id).await {
        Ok(user) => (StatusCode::OK, Json(UserMapper::to_dto(user))).into_response(),
        Err(e) => {
            log_failure("load current user", &e);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtManager;
    use crate::storage::DbConnection;

    async fn setup_test_state() -> AppState {
        let db = DbConnection::in_memory().await.unwrap();
        AppState::new(db, JwtManager::new_dev(3600))
    }

    fn signup_request(username: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
            password: "secret123".to_string(),
            city: None,
        }
    }

    #[tokio::test]
    async fn test_signup_handler() {
        let state = setup_test_state().await;

        let response = signup(State(state.clone()), AppJson(signup_request("alice"))).await;
        assert_eq!(response.into_response().status(), StatusCode::CREATED);

        let duplicate = signup(State(state), AppJson(signup_request("alice"))).await;
        assert_eq!(duplicate.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_handler() {
        let state = setup_test_state().await;
        signup(State(state.clone()), AppJson(signup_request("alice"))).await;

        let ok = login(
            State(state.clone()),
            AppJson(LoginRequest {
                username: "alice".to_string(),
                password: "secret123".to_string(),
            }),
        )
        .await;
        assert_eq!(ok.into_response().status(), StatusCode::OK);

        let bad = login(
            State(state),
            AppJson(LoginRequest {
                username: "alice".to_string(),
                password: "not-it".to_string(),
            }),
        )
        .await;
        assert_eq!(bad.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
