use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::domain::{
    commands::books::CreateBookCommand,
    error::{DomainError, DomainResult},
    models::{book::Book, user::User},
};
use crate::storage::{BookStorage, Connection, UserStorage};

/// Book listings owned by members
#[derive(Clone)]
pub struct BookService<C: Connection> {
    book_repository: C::BookRepository,
    user_repository: C::UserRepository,
}

impl<C: Connection> BookService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            book_repository: connection.create_book_repository(),
            user_repository: connection.create_user_repository(),
        }
    }

    pub async fn create_book(&self, command: CreateBookCommand) -> DomainResult<Book> {
        let title = command.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("Title is required"));
        }

        let book = Book {
            id: Book::generate_id(),
            title: title.to_string(),
            author: command
                .author
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            owner_id: command.owner_id,
            created_at: Utc::now(),
        };
        self.book_repository.store_book(&book).await?;

        info!("Listed book '{}' for owner {}", book.title, book.owner_id);
        Ok(book)
    }

    pub async fn list_books(&self, owner_id: Option<&str>) -> DomainResult<Vec<Book>> {
        self.book_repository.list_books(owner_id).await
    }

    pub async fn get_book(&self, book_id: &str) -> DomainResult<Book> {
        self.book_repository
            .get_book(book_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Book {} not found", book_id)))
    }

    /// Other members in the caller's city who own `title`
    pub async fn search_owners(&self, actor_id: &str, title: &str) -> DomainResult<Vec<User>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(Vec::new());
        }

        let actor = self
            .user_repository
            .get_user(actor_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User {} not found", actor_id)))?;
        let city = actor
            .city
            .as_deref()
            .ok_or_else(|| DomainError::validation("Set a city on your profile to find owners nearby"))?;

        let owners = self
            .user_repository
            .list_owners_in_city(title, city, &actor.id)
            .await?;
        if owners.is_empty() {
            return Err(DomainError::not_found(format!(
                "No users in {} own '{}'",
                city, title
            )));
        }
        Ok(owners)
    }
}
