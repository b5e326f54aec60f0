//! # BookSwap Backend
//!
//! Lending, swapping and selling books between users, with a ratings-driven
//! trust score on every account.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, auth extractors)
//!     ↓
//! Domain Layer (ledger, ratings, trust scoring, badges, chat, requests)
//!     ↓
//! Storage Layer (SQLite repositories)
//! ```

pub mod auth;
pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::JwtManager;
use crate::config::Config;
use crate::domain::{
    BookCatalog, BookService, CatalogService, ChatService, RatingService, RequestService,
    TransactionService, TrustService, UserService,
};
use crate::io::google_books::GoogleBooksClient;
use crate::io::rest::{
    auth_apis, book_apis, chat_apis, rating_apis, request_apis, transaction_apis, trust_apis,
};
use crate::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService<DbConnection>,
    pub book_service: BookService<DbConnection>,
    pub transaction_service: TransactionService<DbConnection>,
    pub rating_service: RatingService<DbConnection>,
    pub trust_service: TrustService<DbConnection>,
    pub chat_service: ChatService<DbConnection>,
    pub request_service: RequestService<DbConnection>,
    pub catalog_service: CatalogService<DbConnection>,
    pub jwt: JwtManager,
}

impl AppState {
    /// State backed by the public Google Books endpoint without an API key
    pub fn new(db_conn: DbConnection, jwt: JwtManager) -> Self {
        Self::with_catalog(db_conn, jwt, Arc::new(GoogleBooksClient::default()))
    }

    pub fn with_catalog(db_conn: DbConnection, jwt: JwtManager, catalog: Arc<dyn BookCatalog>) -> Self {
        let connection = Arc::new(db_conn);

        let trust_service = TrustService::new(connection.clone());
        let user_service = UserService::new(connection.clone(), trust_service.clone());
        let book_service = BookService::new(connection.clone());
        let transaction_service =
            TransactionService::new(connection.clone(), trust_service.clone());
        let rating_service = RatingService::new(connection.clone(), trust_service.clone());
        let chat_service = ChatService::new(connection.clone());
        let request_service = RequestService::new(connection.clone());
        let catalog_service = CatalogService::new(connection, catalog);

        Self {
            user_service,
            book_service,
            transaction_service,
            rating_service,
            trust_service,
            chat_service,
            request_service,
            catalog_service,
            jwt,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db_conn = DbConnection::new(&config.database_url).await?;

    let jwt = match &config.jwt_secret {
        Some(secret) => JwtManager::new(secret.clone(), config.jwt_expiry_seconds)?,
        None => {
            warn!("JWT_SECRET not set, signing tokens with the development secret");
            JwtManager::new_dev(config.jwt_expiry_seconds)
        }
    };

    let catalog = GoogleBooksClient::new(
        config.google_books_url.clone(),
        config.google_books_api_key.clone(),
    );

    info!("Setting up application state");
    Ok(AppState::with_catalog(db_conn, jwt, Arc::new(catalog)))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin: HeaderValue = cors_origin.parse()?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/auth", auth_apis::router())
        .nest("/books", book_apis::router())
        .nest("/requests", request_apis::router())
        .nest("/chat", chat_apis::router())
        .nest("/transactions", transaction_apis::router())
        .nest("/ratings", rating_apis::router())
        .nest("/trust", trust_apis::router());

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
