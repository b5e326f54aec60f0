use crate::domain::commands::requests::BookRequestOutcome;
use crate::domain::models::book_request::{BookRequest, SwapMatch};
use shared::{BookRequestResponse, SwapMatchResponse};

pub struct RequestMapper;

impl RequestMapper {
    pub fn to_dto(request: BookRequest, username: String, matches: Vec<SwapMatch>) -> BookRequestResponse {
        BookRequestResponse {
            id: request.id,
            book_title: request.book_title,
            user_id: request.user_id,
            username,
            created_at: request.created_at,
            matches: matches
                .into_iter()
                .map(|m| SwapMatchResponse {
                    matched_with: m.matched_with,
                    has_your_book: m.has_your_book,
                    wants_your_book: m.wants_your_book,
                })
                .collect(),
        }
    }

    pub fn outcome_to_dto(outcome: BookRequestOutcome) -> BookRequestResponse {
        Self::to_dto(outcome.request, outcome.username, outcome.matches)
    }
}
