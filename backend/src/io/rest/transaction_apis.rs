//! # REST API for Transactions
//!
//! Endpoints for opening lending transactions, moving them through their
//! lifecycle, and the caller's dashboard views.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::domain::commands::transactions::{
    CreateTransactionCommand, TransactionDetails, TransactionListQuery,
    UpdateTransactionStatusCommand,
};
use crate::domain::error::DomainResult;
use crate::io::rest::error::log_failure;
use crate::io::rest::extractors::{AppJson, AppPath, AppQuery, AuthUser};
use crate::io::rest::mappers::TransactionMapper;
use crate::AppState;
use shared::{
    CreateTransactionRequest, TransactionResponse, TransactionSummary,
    UpdateTransactionStatusRequest,
};

// Query parameters for transaction listing API
#[derive(Debug, Deserialize)]
pub struct TransactionListParams {
    pub status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/pending/received", get(pending_received))
        .route("/active/borrowed", get(active_borrowed))
        .route("/active/lent", get(active_lent))
        .route("/:transaction_id", get(get_transaction))
        .route("/:transaction_id/status", patch(update_transaction_status))
}

fn detailed_list(result: DomainResult<Vec<TransactionDetails>>, action: &str) -> Response {
    let now = Utc::now();
    match result {
        Ok(details) => {
            let body: Vec<TransactionResponse> = details
                .into_iter()
                .map(|d| TransactionMapper::to_detailed_dto(d, now))
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log_failure(action, &e);
            e.into_response()
        }
    }
}

/// Request a book; the caller becomes the requester
pub async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<CreateTransactionRequest>,
) -> impl IntoResponse {
    info!("POST /api/transactions - request: {:?}", request);

    let command = CreateTransactionCommand {
        requester_id: auth.user_id,
        book_id: request.book_id,
        owner_id: request.owner_id,
        transaction_type: request.transaction_type,
        expected_return_date: request.expected_return_date,
        security_deposit: request.security_deposit,
        rental_fee: request.rental_fee,
        notes: request.notes,
    };

    match state.transaction_service.create_transaction(command).await {
        Ok(transaction) => (
            StatusCode::CREATED,
            Json(TransactionMapper::to_dto(transaction, Utc::now())),
        )
            .into_response(),
        Err(e) => {
            log_failure("create transaction", &e);
            e.into_response()
        }
    }
}

/// The caller's transactions on either side, optionally filtered by status
pub async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(params): AppQuery<TransactionListParams>,
) -> impl IntoResponse {
    info!("GET /api/transactions - query: {:?}", params);

    let query = TransactionListQuery {
        status: params.status,
    };

    match state
        .transaction_service
        .list_transactions(&auth.user_id, query)
        .await
    {
        Ok(details) => {
            let now = Utc::now();
            let summaries: Vec<TransactionSummary> = details
                .iter()
                .map(|d| TransactionMapper::to_summary(d, &auth.user_id, now))
                .collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(e) => {
            log_failure("list transactions", &e);
            e.into_response()
        }
    }
}

pub async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(transaction_id): AppPath<String>,
) -> impl IntoResponse {
    info!("GET /api/transactions/{}", transaction_id);

    match state
        .transaction_service
        .get_transaction(&auth.user_id, &transaction_id)
        .await
    {
        Ok(details) => (
            StatusCode::OK,
            Json(TransactionMapper::to_detailed_dto(details, Utc::now())),
        )
            .into_response(),
        Err(e) => {
            log_failure("get transaction", &e);
            e.into_response()
        }
    }
}

pub async fn update_transaction_status(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(transaction_id): AppPath<String>,
    AppJson(request): AppJson<UpdateTransactionStatusRequest>,
) -> impl IntoResponse {
    info!(
        "PATCH /api/transactions/{}/status - request: {:?}",
        transaction_id, request
    );

    let command = UpdateTransactionStatusCommand {
        actor_id: auth.user_id,
        transaction_id,
        new_status: request.status,
        actual_return_date: request.actual_return_date,
        notes: request.notes,
    };

    match state.transaction_service.update_status(command).await {
        Ok(transaction) => (
            StatusCode::OK,
            Json(TransactionMapper::to_dto(transaction, Utc::now())),
        )
            .into_response(),
        Err(e) => {
            log_failure("update transaction status", &e);
            e.into_response()
        }
    }
}

/// Pending requests for the caller's books
pub async fn pending_received(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!("GET /api/transactions/pending/received - user: {}", auth.username);
    detailed_list(
        state.transaction_service.pending_received(&auth.user_id).await,
        "list received requests",
    )
}

/// Books the caller currently has from others
pub async fn active_borrowed(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!("GET /api/transactions/active/borrowed - user: {}", auth.username);
    detailed_list(
        state.transaction_service.active_borrowed(&auth.user_id).await,
        "list borrowed books",
    )
}

/// The caller's books currently with others
pub async fn active_lent(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!("GET /api/transactions/active/lent - user: {}", auth.username);
    detailed_list(
        state.transaction_service.active_lent(&auth.user_id).await,
        "list lent books",
    )
}
