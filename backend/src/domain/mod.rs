//! # Domain Module
//!
//! Business logic for BookSwap: the transaction ledger, the rating store, and
//! trust scoring with its badges. Services are generic over the storage
//! [`Connection`](crate::storage::Connection) and take the acting user as an
//! explicit argument on every operation.
//!
//! ## Module Organization
//!
//! - **transaction_service**: creating transactions and the status state machine
//! - **rating_service**: submitting ratings and the pending-ratings reminder list
//! - **trust_scoring**: pure score and badge rules
//! - **trust_service**: recompute orchestration, profiles, leaderboard
//! - **badge_registry**: display metadata for badges and trust levels
//! - **user_service** / **book_service**: accounts, listings and owner search by city
//! - **chat_service**: two-member rooms about a book, with unread tracking
//! - **request_service**: wanted-book requests and swap matching within a city
//! - **catalog**: external catalog search annotated with local availability
//!
//! ## Business Rules
//!
//! - A user never transacts with themselves, and a book has at most one
//!   pending or active transaction at a time
//! - Ratings are only accepted on completed transactions, one per party
//! - A user's aggregate counters, trust score and badges are written only by
//!   the trust recompute, after a transaction completes or a rating lands

pub mod badge_registry;
pub mod book_service;
pub mod catalog;
pub mod chat_service;
pub mod commands;
pub mod error;
pub mod models;
pub mod rating_service;
pub mod request_service;
pub mod transaction_service;
pub mod trust_scoring;
pub mod trust_service;
pub mod user_service;

pub use book_service::BookService;
pub use catalog::{BookCatalog, CatalogService};
pub use chat_service::ChatService;
pub use error::{DomainError, DomainResult};
pub use rating_service::RatingService;
pub use request_service::RequestService;
pub use transaction_service::TransactionService;
pub use trust_service::TrustService;
pub use user_service::UserService;
