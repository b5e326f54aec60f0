//! # REST API for Trust
//!
//! Profiles, summaries, the leaderboard, and the display metadata lookups.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::badge_registry::{badge_info, trust_level_info};
use crate::io::rest::error::log_failure;
use crate::io::rest::extractors::{AppPath, AppQuery, AuthUser};
use crate::io::rest::mappers::TrustMapper;
use crate::AppState;
use shared::UserTrustSummary;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/:user_id", get(trust_profile))
        .route("/summary/:user_id", get(trust_summary))
        .route("/badge-info/:badge_type", get(get_badge_info))
        .route("/trust-level-info/:score", get(get_trust_level_info))
        .route("/update-trust-score/:user_id", post(update_trust_score))
        .route("/leaderboard", get(leaderboard))
}

pub async fn trust_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    AppPath(user_id): AppPath<String>,
) -> impl IntoResponse {
    info!("GET /api/trust/profile/{}", user_id);

    match state.trust_service.get_profile(&user_id).await {
        Ok(profile) => (StatusCode::OK, Json(TrustMapper::profile_to_dto(profile))).into_response(),
        Err(e) => {
            log_failure("load trust profile", &e);
            e.into_response()
        }
    }
}

pub async fn trust_summary(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<String>,
) -> impl IntoResponse {
    info!("GET /api/trust/summary/{}", user_id);

    match state.trust_service.get_summary(&user_id).await {
        Ok(summary) => (StatusCode::OK, Json(TrustMapper::summary_to_dto(summary))).into_response(),
        Err(e) => {
            log_failure("load trust summary", &e);
            e.into_response()
        }
    }
}

pub async fn get_badge_info(AppPath(badge_type): AppPath<String>) -> impl IntoResponse {
    info!("GET /api/trust/badge-info/{}", badge_type);
    Json(TrustMapper::badge_info_to_dto(badge_info(&badge_type)))
}

pub async fn get_trust_level_info(AppPath(score): AppPath<f64>) -> impl IntoResponse {
    info!("GET /api/trust/trust-level-info/{}", score);
    Json(TrustMapper::level_info_to_dto(trust_level_info(score)))
}

/// Recompute the caller's own trust score on demand
pub async fn update_trust_score(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(user_id): AppPath<String>,
) -> impl IntoResponse {
    info!("POST /api/trust/update-trust-score/{}", user_id);

    match state
        .trust_service
        .update_trust_score(&auth.user_id, &user_id)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(TrustMapper::update_to_dto(result))).into_response(),
        Err(e) => {
            log_failure("update trust score", &e);
            e.into_response()
        }
    }
}

pub async fn leaderboard(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LeaderboardQuery>,
) -> impl IntoResponse {
    info!("GET /api/trust/leaderboard - query: {:?}", query);

    match state.trust_service.leaderboard(query.limit).await {
        Ok(summaries) => {
            let body: Vec<UserTrustSummary> = summaries
                .into_iter()
                .map(TrustMapper::summary_to_dto)
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log_failure("load leaderboard", &e);
            e.into_response()
        }
    }
}
