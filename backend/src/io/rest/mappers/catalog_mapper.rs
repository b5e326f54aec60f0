use crate::domain::catalog::CatalogMatch;
use shared::CatalogBookResponse;

pub struct CatalogMapper;

impl CatalogMapper {
    pub fn to_dto(found: CatalogMatch) -> CatalogBookResponse {
        let volume = found.volume;
        CatalogBookResponse {
            title: volume.title,
            author: volume.author,
            publisher: volume.publisher,
            published_date: volume.published_date,
            description: volume.description,
            thumbnail: volume.thumbnail,
            isbn: volume.isbn,
            average_rating: volume.average_rating,
            ratings_count: volume.ratings_count,
            categories: volume.categories,
            relevance_score: volume.relevance_score,
            available_in_city: found.available_in_city,
            local_owners_count: found.local_owners_count,
        }
    }
}
