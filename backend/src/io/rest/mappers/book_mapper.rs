use crate::domain::models::book::Book;
use shared::BookResponse;

pub struct BookMapper;

impl BookMapper {
    pub fn to_dto(domain: Book) -> BookResponse {
        BookResponse {
            id: domain.id,
            title: domain.title,
            author: domain.author,
            owner_id: domain.owner_id,
            created_at: domain.created_at,
        }
    }
}
