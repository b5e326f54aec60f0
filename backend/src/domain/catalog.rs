//! External book catalog lookups, annotated with local availability.
//!
//! The catalog itself sits behind [`BookCatalog`] so the service can be
//! exercised without a network; the Google Books client lives in
//! `io::google_books`.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::book::Book;
use crate::storage::{BookStorage, Connection, UserStorage};

/// One volume returned by a catalog search
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogVolume {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub published_date: String,
    pub description: String,
    pub thumbnail: String,
    pub isbn: Option<String>,
    pub average_rating: f64,
    pub ratings_count: u32,
    pub categories: Vec<String>,
    pub relevance_score: f64,
}

/// A catalog volume plus whether neighbours already own it
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMatch {
    pub volume: CatalogVolume,
    pub available_in_city: bool,
    pub local_owners_count: u32,
}

#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Volumes whose title matches `query`, most relevant first
    async fn search(&self, query: &str) -> DomainResult<Vec<CatalogVolume>>;
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Count distinct local owners per title and attach the counts to each volume
pub fn annotate_with_local_books(volumes: Vec<CatalogVolume>, local_books: &[Book]) -> Vec<CatalogMatch> {
    let mut owners_by_title: HashMap<String, HashSet<&str>> = HashMap::new();
    for book in local_books {
        owners_by_title
            .entry(title_key(&book.title))
            .or_default()
            .insert(book.owner_id.as_str());
    }

    volumes
        .into_iter()
        .map(|volume| {
            let count = owners_by_title
                .get(&title_key(&volume.title))
                .map_or(0, |owners| owners.len() as u32);
            CatalogMatch {
                volume,
                available_in_city: count > 0,
                local_owners_count: count,
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct CatalogService<C: Connection> {
    catalog: Arc<dyn BookCatalog>,
    user_repository: C::UserRepository,
    book_repository: C::BookRepository,
}

impl<C: Connection> CatalogService<C> {
    pub fn new(connection: Arc<C>, catalog: Arc<dyn BookCatalog>) -> Self {
        Self {
            catalog,
            user_repository: connection.create_user_repository(),
            book_repository: connection.create_book_repository(),
        }
    }

    /// Search the catalog; when the caller has a city, mark which results
    /// other members there already own.
    pub async fn search(&self, actor_id: &str, query: &str) -> DomainResult<Vec<CatalogMatch>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let actor = self
            .user_repository
            .get_user(actor_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User {} not found", actor_id)))?;

        let volumes = self.catalog.search(query).await?;
        let local_books = match actor.city.as_deref() {
            Some(city) => self.book_repository.list_books_in_city(city, &actor.id).await?,
            None => Vec::new(),
        };

        info!(
            "Catalog search '{}' returned {} volumes, {} local books considered",
            query,
            volumes.len(),
            local_books.len()
        );
        Ok(annotate_with_local_books(volumes, &local_books))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::TestEnvironment;
    use crate::storage::DbConnection;
    use chrono::Utc;

    struct FixedCatalog(Vec<&'static str>);

    #[async_trait]
    impl BookCatalog for FixedCatalog {
        async fn search(&self, _query: &str) -> DomainResult<Vec<CatalogVolume>> {
            Ok(self.0.iter().map(|title| volume(title)).collect())
        }
    }

    fn volume(title: &str) -> CatalogVolume {
        CatalogVolume {
            title: title.to_string(),
            author: "Unknown".to_string(),
            publisher: "Unknown".to_string(),
            published_date: "Unknown".to_string(),
            description: String::new(),
            thumbnail: String::new(),
            isbn: None,
            average_rating: 0.0,
            ratings_count: 0,
            categories: Vec::new(),
            relevance_score: 0.0,
        }
    }

    fn book(owner: &str, title: &str) -> Book {
        Book {
            id: Book::generate_id(),
            title: title.to_string(),
            author: None,
            owner_id: owner.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_annotation_counts_distinct_owners() {
        let local = vec![
            book("u1", "Dune"),
            book("u1", "dune "),
            book("u2", "DUNE"),
            book("u3", "Emma"),
        ];
        let matches = annotate_with_local_books(vec![volume("Dune"), volume("Kindred")], &local);

        assert!(matches[0].available_in_city);
        assert_eq!(matches[0].local_owners_count, 2);
        assert!(!matches[1].available_in_city);
        assert_eq!(matches[1].local_owners_count, 0);
    }

    #[tokio::test]
    async fn test_search_uses_callers_city() {
        let env = TestEnvironment::new().await.unwrap();
        let me = env.add_user_in_city("me", Some("porto")).await;
        let near = env.add_user_in_city("near", Some("porto")).await;
        let far = env.add_user_in_city("far", Some("lisbon")).await;
        let nomad = env.add_user("nomad").await;
        env.add_book(&near, "Dune").await;
        env.add_book(&far, "Kindred").await;
        env.add_book(&me, "Kindred").await;

        let service: CatalogService<DbConnection> = CatalogService::new(
            Arc::new(env.connection.clone()),
            Arc::new(FixedCatalog(vec!["Dune", "Kindred"])),
        );

        let results = service.search(&me.id, "d").await.unwrap();
        let flags: Vec<(&str, u32)> = results
            .iter()
            .map(|m| (m.volume.title.as_str(), m.local_owners_count))
            .collect();
        assert_eq!(flags, vec![("Dune", 1), ("Kindred", 0)]);

        let cityless = service.search(&nomad.id, "d").await.unwrap();
        assert!(cityless.iter().all(|m| !m.available_in_city));

        assert!(service.search(&me.id, "   ").await.unwrap().is_empty());
    }
}
