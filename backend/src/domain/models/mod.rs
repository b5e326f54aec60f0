pub mod badge;
pub mod book;
pub mod book_request;
pub mod chat;
pub mod rating;
pub mod transaction;
pub mod user;
