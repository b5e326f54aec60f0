//! Domain <-> wire DTO conversions.

pub mod book_mapper;
pub mod catalog_mapper;
pub mod chat_mapper;
pub mod rating_mapper;
pub mod request_mapper;
pub mod transaction_mapper;
pub mod trust_mapper;
pub mod user_mapper;

pub use book_mapper::BookMapper;
pub use catalog_mapper::CatalogMapper;
pub use chat_mapper::ChatMapper;
pub use rating_mapper::RatingMapper;
pub use request_mapper::RequestMapper;
pub use transaction_mapper::TransactionMapper;
pub use trust_mapper::TrustMapper;
pub use user_mapper::UserMapper;
