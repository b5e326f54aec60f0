//! # Storage Traits
//!
//! This module defines the storage abstraction traits the domain services are
//! generic over. Implementations report uniqueness violations as
//! `DomainError::Conflict` so services can surface them unchanged.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::domain::commands::trust::TrustUpdate;
use crate::domain::error::DomainResult;
use crate::domain::models::{
    badge::TrustBadge,
    book::Book,
    book_request::BookRequest,
    chat::{ChatMessage, ChatRoom},
    rating::Rating,
    transaction::{Transaction, TransactionStatus},
    user::User,
};

/// Which side of a transaction a listing filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartySide {
    /// Owner or requester
    Either,
    Owner,
    Requester,
}

#[async_trait]
pub trait UserStorage: Send + Sync + Clone {
    /// Store a new user. Duplicate username or email yields `Conflict`.
    async fn store_user(&self, user: &User) -> DomainResult<()>;

    async fn get_user(&self, user_id: &str) -> DomainResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>>;

    /// Visible users ordered by trust score, highest first
    async fn list_top_trusted(&self, limit: u32) -> DomainResult<Vec<User>>;

    /// Users in `city`, other than `excluding_user_id`, who own a book titled
    /// `title` (case-insensitive), ordered by username
    async fn list_owners_in_city(
        &self,
        title: &str,
        city: &str,
        excluding_user_id: &str,
    ) -> DomainResult<Vec<User>>;
}

#[async_trait]
pub trait BookStorage: Send + Sync + Clone {
    async fn store_book(&self, book: &Book) -> DomainResult<()>;

    async fn get_book(&self, book_id: &str) -> DomainResult<Option<Book>>;

    /// Books ordered newest first, optionally restricted to one owner
    async fn list_books(&self, owner_id: Option<&str>) -> DomainResult<Vec<Book>>;

    async fn count_books_by_owner(&self, owner_id: &str) -> DomainResult<u32>;

    /// Books owned by members of `city` other than `excluding_owner_id`
    async fn list_books_in_city(
        &self,
        city: &str,
        excluding_owner_id: &str,
    ) -> DomainResult<Vec<Book>>;
}

#[async_trait]
pub trait TransactionStorage: Send + Sync + Clone {
    /// Store a new transaction. A second pending/active transaction on the
    /// same book yields `Conflict`.
    async fn store_transaction(&self, transaction: &Transaction) -> DomainResult<()>;

    async fn get_transaction(&self, transaction_id: &str) -> DomainResult<Option<Transaction>>;

    /// The pending or active transaction holding `book_id`, if any
    async fn find_open_for_book(&self, book_id: &str) -> DomainResult<Option<Transaction>>;

    /// Write every mutable field of `transaction`, but only if the stored
    /// status still equals `expected_status`. Returns false when another
    /// writer got there first.
    async fn update_transaction(
        &self,
        transaction: &Transaction,
        expected_status: TransactionStatus,
    ) -> DomainResult<bool>;

    /// Transactions involving `user_id` on the given side, newest first
    async fn list_for_user(
        &self,
        user_id: &str,
        side: PartySide,
        status: Option<TransactionStatus>,
    ) -> DomainResult<Vec<Transaction>>;
}

#[async_trait]
pub trait RatingStorage: Send + Sync + Clone {
    /// Store a new rating. A second rating by the same rater on the same
    /// transaction yields `Conflict`.
    async fn store_rating(&self, rating: &Rating) -> DomainResult<()>;

    async fn find_by_rater_and_transaction(
        &self,
        rater_id: &str,
        transaction_id: &str,
    ) -> DomainResult<Option<Rating>>;

    /// Ratings received by `user_id`, newest first
    async fn list_received(&self, user_id: &str, limit: Option<u32>) -> DomainResult<Vec<Rating>>;

    async fn list_for_transaction(&self, transaction_id: &str) -> DomainResult<Vec<Rating>>;

    /// Ids of every transaction `rater_id` has already rated
    async fn rated_transaction_ids(&self, rater_id: &str) -> DomainResult<HashSet<String>>;
}

#[async_trait]
pub trait TrustStorage: Send + Sync + Clone {
    /// All badge rows for the user, active or not
    async fn list_badges(&self, user_id: &str) -> DomainResult<Vec<TrustBadge>>;

    /// Write the user's counters, score and hidden flag and sync the badge
    /// rows in a single database transaction. Badges in `update.badges` end
    /// up active (created if new); every other badge row is deactivated.
    async fn apply_trust_update(&self, update: &TrustUpdate) -> DomainResult<()>;
}

#[async_trait]
pub trait ChatStorage: Send + Sync + Clone {
    /// Store a new room. A second room for the same pair and title, in
    /// either order, yields `Conflict`.
    async fn store_room(&self, room: &ChatRoom) -> DomainResult<()>;

    async fn get_room(&self, room_id: &str) -> DomainResult<Option<ChatRoom>>;

    /// The room between the two users about `book_title`, whichever of them opened it
    async fn find_room(
        &self,
        user_a: &str,
        user_b: &str,
        book_title: &str,
    ) -> DomainResult<Option<ChatRoom>>;

    /// Rooms `user_id` belongs to, most recent activity first
    async fn list_rooms_for_user(&self, user_id: &str) -> DomainResult<Vec<ChatRoom>>;

    /// Insert the message and bump the room's `last_message_at` together
    async fn append_message(&self, message: &ChatMessage) -> DomainResult<()>;

    /// Messages in a room, oldest first
    async fn list_messages(&self, room_id: &str) -> DomainResult<Vec<ChatMessage>>;

    async fn last_message(&self, room_id: &str) -> DomainResult<Option<ChatMessage>>;

    /// Unread messages in the room sent by anyone but `reader_id`
    async fn count_unread(&self, room_id: &str, reader_id: &str) -> DomainResult<u32>;

    /// Mark every message not sent by `reader_id` as read
    async fn mark_read(&self, room_id: &str, reader_id: &str) -> DomainResult<u64>;

    /// Remove the room and its messages. Returns false if it did not exist.
    async fn delete_room(&self, room_id: &str) -> DomainResult<bool>;
}

#[async_trait]
pub trait BookRequestStorage: Send + Sync + Clone {
    async fn store_request(&self, request: &BookRequest) -> DomainResult<()>;

    /// Requests made by `user_id`, newest first
    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<BookRequest>>;
}

/// Trait for database connections that can create repositories
pub trait Connection: Send + Sync + Clone {
    type UserRepository: UserStorage;
    type BookRepository: BookStorage;
    type TransactionRepository: TransactionStorage;
    type RatingRepository: RatingStorage;
    type TrustRepository: TrustStorage;
    type ChatRepository: ChatStorage;
    type BookRequestRepository: BookRequestStorage;

    fn create_user_repository(&self) -> Self::UserRepository;
    fn create_book_repository(&self) -> Self::BookRepository;
    fn create_transaction_repository(&self) -> Self::TransactionRepository;
    fn create_rating_repository(&self) -> Self::RatingRepository;
    fn create_trust_repository(&self) -> Self::TrustRepository;
    fn create_chat_repository(&self) -> Self::ChatRepository;
    fn create_book_request_repository(&self) -> Self::BookRequestRepository;
}
