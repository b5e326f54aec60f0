use crate::domain::models::user::User;
use shared::UserResponse;

pub struct UserMapper;

impl UserMapper {
    /// Public view of a user; the password hash never leaves the backend
    pub fn to_dto(domain: User) -> UserResponse {
        UserResponse {
            id: domain.id,
            username: domain.username,
            email: domain.email,
            city: domain.city,
            created_at: domain.created_at,
        }
    }
}
