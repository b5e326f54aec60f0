//! Accounts: signup, login and user lookup.
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::domain::{
    commands::accounts::{LoginCommand, SignupCommand},
    error::{DomainError, DomainResult},
    models::user::User,
    trust_scoring::{trust_score, TrustAggregate},
    trust_service::TrustService,
};
use crate::storage::{Connection, UserStorage};

pub const MIN_PASSWORD_LEN: usize = 6;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Cities are compared verbatim when matching neighbours, so they are stored
/// trimmed and lowercased
pub fn normalize_city(city: Option<String>) -> Option<String> {
    non_blank(city).map(|c| c.to_lowercase())
}

/// A fresh account, scored as the all-zero aggregate
fn new_account(
    username: String,
    email: Option<String>,
    password_hash: String,
    city: Option<String>,
) -> User {
    let aggregate = TrustAggregate::default();
    User {
        id: User::generate_id(),
        username,
        email: non_blank(email),
        password_hash,
        city: normalize_city(city),
        created_at: Utc::now(),
        average_rating: aggregate.average_rating,
        total_ratings: aggregate.total_ratings,
        total_transactions: aggregate.total_transactions,
        successful_transactions: aggregate.successful_transactions,
        late_returns: aggregate.late_returns,
        trust_score: trust_score(&aggregate),
        is_profile_hidden: false,
    }
}

#[derive(Clone)]
pub struct UserService<C: Connection> {
    user_repository: C::UserRepository,
    trust_service: TrustService<C>,
}

impl<C: Connection> UserService<C> {
    pub fn new(connection: Arc<C>, trust_service: TrustService<C>) -> Self {
        Self {
            user_repository: connection.create_user_repository(),
            trust_service,
        }
    }

    /// Register a new member and give them their initial trust score and badges
    pub async fn signup(&self, command: SignupCommand) -> DomainResult<User> {
        let username = command.username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::validation("Username is required"));
        }
        if command.password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let password_hash = hash_password_blocking(command.password).await?;
        let user = new_account(username, command.email, password_hash, command.city);
        self.user_repository.store_user(&user).await?;
        info!("Registered user {} ({})", user.username, user.id);

        self.trust_service.recompute_after_change(&user.id).await;
        self.get_user(&user.id).await
    }

    /// Check credentials; unknown user and wrong password are indistinguishable
    pub async fn login(&self, command: LoginCommand) -> DomainResult<User> {
        let invalid = || DomainError::unauthorized("Incorrect username or password");

        let user = self
            .user_repository
            .get_user_by_username(command.username.trim())
            .await?
            .ok_or_else(invalid)?;

        let matches =
            verify_password_blocking(command.password, user.password_hash.clone()).await?;
        if !matches {
            return Err(invalid());
        }
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> DomainResult<User> {
        self.user_repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User {} not found", user_id)))
    }
}
