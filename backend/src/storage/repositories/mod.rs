// Repository modules
pub mod book_repository;
pub mod book_request_repository;
pub mod chat_repository;
pub mod rating_repository;
pub mod transaction_repository;
pub mod trust_repository;
pub mod user_repository;

// Re-export repository types
pub use book_repository::BookRepository;
pub use book_request_repository::BookRequestRepository;
pub use chat_repository::ChatRepository;
pub use rating_repository::RatingRepository;
pub use transaction_repository::TransactionRepository;
pub use trust_repository::TrustRepository;
pub use user_repository::UserRepository;
