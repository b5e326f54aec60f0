//! Google Books volume search.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::catalog::{BookCatalog, CatalogVolume};
use crate::domain::error::{DomainError, DomainResult};

pub const DEFAULT_GOOGLE_BOOKS_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const MAX_RESULTS: u32 = 10;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Deserialize)]
struct VolumesPage {
    #[serde(default)]
    items: Vec<VolumeItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeItem {
    #[serde(default)]
    volume_info: VolumeInfo,
    #[serde(default)]
    sale_info: SaleInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    image_links: Option<ImageLinks>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    average_rating: Option<f64>,
    ratings_count: Option<u32>,
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Debug, Default, Deserialize)]
struct SaleInfo {
    saleability: Option<String>,
}

/// Rating weight only counts when both the average and the count are present
fn relevance(info: &VolumeInfo, sale: &SaleInfo) -> f64 {
    let mut score = match (info.average_rating, info.ratings_count) {
        (Some(avg), Some(count)) if avg > 0.0 && count > 0 => avg + f64::from(count),
        _ => 0.0,
    };
    if matches!(sale.saleability.as_deref(), Some("FOR_SALE") | Some("FREE")) {
        score += 0.5;
    }
    if info.description.as_deref().is_some_and(|d| !d.is_empty()) {
        score += 1.0;
    }
    let has_thumbnail = info
        .image_links
        .as_ref()
        .and_then(|links| links.thumbnail.as_deref())
        .is_some_and(|t| !t.is_empty());
    if has_thumbnail {
        score += 1.0;
    }
    score
}

fn to_volume(item: VolumeItem) -> CatalogVolume {
    let relevance_score = relevance(&item.volume_info, &item.sale_info);
    let info = item.volume_info;

    let author = if info.authors.is_empty() {
        "Unknown".to_string()
    } else {
        info.authors.join(", ")
    };
    let isbn = info
        .industry_identifiers
        .into_iter()
        .find(|id| id.kind == "ISBN_10" || id.kind == "ISBN_13")
        .map(|id| id.identifier);

    CatalogVolume {
        title: info.title.unwrap_or_else(|| "Unknown".to_string()),
        author,
        publisher: info.publisher.unwrap_or_else(|| "Unknown".to_string()),
        published_date: info.published_date.unwrap_or_else(|| "Unknown".to_string()),
        description: info.description.unwrap_or_default(),
        thumbnail: info
            .image_links
            .and_then(|links| links.small_thumbnail)
            .unwrap_or_default(),
        isbn,
        average_rating: info.average_rating.unwrap_or(0.0),
        ratings_count: info.ratings_count.unwrap_or(0),
        categories: info.categories,
        relevance_score,
    }
}

fn rank(page: VolumesPage) -> Vec<CatalogVolume> {
    let mut volumes: Vec<CatalogVolume> = page.items.into_iter().map(to_volume).collect();
    volumes.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    volumes
}

/// HTTP client for the Google Books `volumes` endpoint
pub struct GoogleBooksClient {
    base_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl GoogleBooksClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("bookswap-backend/0.1")
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into(),
            api_key,
            http_client,
        }
    }
}

impl Default for GoogleBooksClient {
    fn default() -> Self {
        Self::new(DEFAULT_GOOGLE_BOOKS_URL, None)
    }
}

#[async_trait]
impl BookCatalog for GoogleBooksClient {
    async fn search(&self, query: &str) -> DomainResult<Vec<CatalogVolume>> {
        let search_failed = |detail: String| {
            warn!("Google Books search for '{}' failed: {}", query, detail);
            DomainError::Internal(format!("Search failed: {}", detail))
        };

        let q = format!("intitle:{}", query);
        let max_results = MAX_RESULTS.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("q", q.as_str()),
            ("maxResults", max_results.as_str()),
            ("orderBy", "relevance"),
            ("projection", "full"),
            ("langRestrict", "en"),
        ];
        if let Some(key) = self.api_key.as_deref() {
            params.push(("key", key));
        }

        debug!("Querying {} for '{}'", self.base_url, query);
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| search_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(search_failed(format!("HTTP {}", response.status())));
        }

        let page: VolumesPage = response
            .json()
            .await
            .map_err(|e| search_failed(e.to_string()))?;

        Ok(rank(page))
    }
}
