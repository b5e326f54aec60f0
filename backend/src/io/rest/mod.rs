//! # REST API Interface Layer
//!
//! HTTP endpoints for BookSwap. Handlers translate request bodies into domain
//! commands, attach the authenticated actor, and map domain errors onto
//! status codes (see [`error`]).
//!
//! Every route except signup, login, book listings, public rating lists,
//! trust summaries, the leaderboard and the registry lookups requires a
//! bearer token.

pub mod auth_apis;
pub mod book_apis;
pub mod chat_apis;
pub mod error;
pub mod extractors;
pub mod mappers;
pub mod rating_apis;
pub mod request_apis;
pub mod transaction_apis;
pub mod trust_apis;
