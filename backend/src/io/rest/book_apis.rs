//! # REST API for Books
//!
//! Listings a transaction can be opened against, plus catalog search and
//! owner lookup within the caller's city.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::commands::books::CreateBookCommand;
use crate::io::rest::error::log_failure;
use crate::io::rest::extractors::{AppJson, AppPath, AppQuery, AuthUser};
use crate::io::rest::mappers::{BookMapper, CatalogMapper, UserMapper};
use crate::AppState;
use shared::{
    BookResponse, BookSearchQuery, CatalogBookResponse, CreateBookRequest, OwnerSearchQuery,
    UserResponse,
};

#[derive(Debug, Deserialize)]
pub struct BookListQuery {
    pub owner_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/search", get(search_catalog))
        .route("/search-owners", get(search_owners))
        .route("/:book_id", get(get_book))
}

/// List a book owned by the caller
pub async fn create_book(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<CreateBookRequest>,
) -> impl IntoResponse {
    info!("POST /api/books - request: {:?}", request);

    let command = CreateBookCommand {
        owner_id: auth.user_id,
        title: request.title,
        author: request.author,
    };

    match state.book_service.create_book(command).await {
        Ok(book) => (StatusCode::CREATED, Json(BookMapper::to_dto(book))).into_response(),
        Err(e) => {
            log_failure("create book", &e);
            e.into_response()
        }
    }
}

pub async fn list_books(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BookListQuery>,
) -> impl IntoResponse {
    info!("GET /api/books - query: {:?}", query);

    match state.book_service.list_books(query.owner_id.as_deref()).await {
        Ok(books) => {
            let books: Vec<BookResponse> = books.into_iter().map(BookMapper::to_dto).collect();
            (StatusCode::OK, Json(books)).into_response()
        }
        Err(e) => {
            log_failure("list books", &e);
            e.into_response()
        }
    }
}

pub async fn get_book(
    State(state): State<AppState>,
    AppPath(book_id): AppPath<String>,
) -> impl IntoResponse {
    info!("GET /api/books/{}", book_id);

    match state.book_service.get_book(&book_id).await {
        Ok(book) => (StatusCode::OK, Json(BookMapper::to_dto(book))).into_response(),
        Err(e) => {
            log_failure("get book", &e);
            e.into_response()
        }
    }
}

/// Catalog search, flagged with what neighbours already own
pub async fn search_catalog(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(query): AppQuery<BookSearchQuery>,
) -> impl IntoResponse {
    info!("GET /api/books/search - query: {:?}", query);

    match state.catalog_service.search(&auth.user_id, &query.query).await {
        Ok(found) => {
            let body: Vec<CatalogBookResponse> = found.into_iter().map(CatalogMapper::to_dto).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log_failure("search catalog", &e);
            e.into_response()
        }
    }
}

/// Members in the caller's city who own a title
pub async fn search_owners(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(query): AppQuery<OwnerSearchQuery>,
) -> impl IntoResponse {
    info!("GET /api/books/search-owners - query: {:?}", query);

    match state.book_service.search_owners(&auth.user_id, &query.book_title).await {
        Ok(owners) => {
            let body: Vec<UserResponse> = owners.into_iter().map(UserMapper::to_dto).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log_failure("search owners", &e);
            e.into_response()
        }
    }
}
