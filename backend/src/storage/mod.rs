//! # Storage Module
//!
//! Persistence for users, books, transactions, ratings, trust badges, chat
//! rooms and book requests.
//!
//! The domain services only see the traits in [`traits`]; the SQLite
//! implementation lives in [`repositories`] and is wired up through
//! [`DbConnection`].
//!
//! ## Guarantees enforced by the schema
//!
//! - At most one pending or active transaction per book (partial unique index)
//! - One rating per rater per transaction
//! - One badge row per user and badge type
//! - Ratings in `1..=5`, non-negative money, owner distinct from requester
//! - One chat room per pair of members and book title

pub mod connection;
pub mod repositories;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

// Re-export the main types that other modules need
pub use connection::DbConnection;
pub use traits::{
    BookRequestStorage, BookStorage, ChatStorage, Connection, PartySide, RatingStorage,
    TransactionStorage, TrustStorage, UserStorage,
};
