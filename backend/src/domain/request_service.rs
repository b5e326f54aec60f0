//! Wanted-book requests and city-local swap matching.
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::info;

use crate::domain::{
    commands::requests::{BookRequestOutcome, CreateBookRequestCommand},
    error::{DomainError, DomainResult},
    models::{
        book::Book,
        book_request::{BookRequest, SwapMatch},
        user::User,
    },
};
use crate::storage::{BookRequestStorage, BookStorage, Connection, UserStorage};

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Pair the requester with each owner of `requested_title` who in turn wants
/// one of the requester's books. When several of the requester's books are
/// wanted, the alphabetically first is offered.
pub fn find_swap_matches(
    requested_title: &str,
    my_books: &[Book],
    owners: &[(User, Vec<BookRequest>)],
) -> Vec<SwapMatch> {
    let my_titles: BTreeMap<String, &str> = my_books
        .iter()
        .map(|b| (title_key(&b.title), b.title.as_str()))
        .collect();

    owners
        .iter()
        .filter_map(|(owner, wanted)| {
            let wanted: BTreeSet<String> = wanted.iter().map(|r| title_key(&r.book_title)).collect();
            let offered = my_titles
                .iter()
                .find(|(key, _)| wanted.contains(*key))
                .map(|(_, title)| title.to_string())?;
            Some(SwapMatch {
                matched_with: owner.username.clone(),
                has_your_book: requested_title.to_string(),
                wants_your_book: offered,
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct RequestService<C: Connection> {
    request_repository: C::BookRequestRepository,
    user_repository: C::UserRepository,
    book_repository: C::BookRepository,
}

impl<C: Connection> RequestService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            request_repository: connection.create_book_request_repository(),
            user_repository: connection.create_user_repository(),
            book_repository: connection.create_book_repository(),
        }
    }

    /// Record that the caller wants a title and look for swap partners nearby
    pub async fn create_request(&self, command: CreateBookRequestCommand) -> DomainResult<BookRequestOutcome> {
        let book_title = command.book_title.trim();
        if book_title.is_empty() {
            return Err(DomainError::validation("Book title is required"));
        }

        let user = self
            .user_repository
            .get_user(&command.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))?;

        let request = BookRequest {
            id: BookRequest::generate_id(),
            user_id: user.id.clone(),
            book_title: book_title.to_string(),
            created_at: Utc::now(),
        };
        self.request_repository.store_request(&request).await?;
        info!("{} requested '{}'", user.username, request.book_title);

        let matches = match user.city.as_deref() {
            Some(city) => self.match_in_city(&user, city, book_title).await?,
            None => Vec::new(),
        };
        if matches.is_empty() {
            info!("No swap matches yet for '{}'", request.book_title);
        } else {
            info!("Found {} swap matches for '{}'", matches.len(), request.book_title);
        }

        Ok(BookRequestOutcome {
            request,
            username: user.username,
            matches,
        })
    }

    pub async fn list_requests(&self, user_id: &str) -> DomainResult<Vec<BookRequest>> {
        self.request_repository.list_for_user(user_id).await
    }

    async fn match_in_city(&self, user: &User, city: &str, book_title: &str) -> DomainResult<Vec<SwapMatch>> {
        let owners = self
            .user_repository
            .list_owners_in_city(book_title, city, &user.id)
            .await?;
        if owners.is_empty() {
            return Ok(Vec::new());
        }

        let my_books = self.book_repository.list_books(Some(&user.id)).await?;
        let mut candidates = Vec::with_capacity(owners.len());
        for owner in owners {
            let wanted = self.request_repository.list_for_user(&owner.id).await?;
            candidates.push((owner, wanted));
        }
        Ok(find_swap_matches(book_title, &my_books, &candidates))
    }
}
