use crate::domain::models::rating::{PendingRating, Rating, RatingView};
use shared::{PendingRatingResponse, RatingResponse};

pub struct RatingMapper;

impl RatingMapper {
    pub fn to_dto(view: RatingView) -> RatingResponse {
        let rating = view.rating;
        RatingResponse {
            id: rating.id,
            rater_id: rating.rater_id,
            rated_user_id: rating.rated_user_id,
            transaction_id: rating.transaction_id,
            rating: rating.score as i64,
            review_text: rating.review_text,
            rating_type: rating.role.as_str().to_string(),
            created_at: rating.created_at,
            rater_username: view.rater_username,
        }
    }

    /// Freshly submitted rating; the rater is the caller
    pub fn submitted_to_dto(rating: Rating, rater_username: String) -> RatingResponse {
        Self::to_dto(RatingView {
            rating,
            rater_username: Some(rater_username),
        })
    }

    pub fn pending_to_dto(pending: PendingRating) -> PendingRatingResponse {
        PendingRatingResponse {
            transaction_id: pending.transaction_id,
            other_user_id: pending.other_user_id,
            other_user_username: pending.other_user_username,
            book_title: pending.book_title,
            transaction_type: pending.transaction_type.as_str().to_string(),
            completed_date: pending.completed_date,
            rating_type: pending.role.as_str().to_string(),
        }
    }
}
