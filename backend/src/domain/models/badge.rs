use chrono::{DateTime, Utc};
use std::fmt;

/// Badges the trust scorer can award
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BadgeType {
    Reliable,
    QuickReturner,
    NewUser,
    Verified,
    BookCurator,
    ActiveMember,
    TrustedLender,
}

impl BadgeType {
    pub const ALL: [BadgeType; 7] = [
        BadgeType::Reliable,
        BadgeType::QuickReturner,
        BadgeType::NewUser,
        BadgeType::Verified,
        BadgeType::BookCurator,
        BadgeType::ActiveMember,
        BadgeType::TrustedLender,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BadgeType::Reliable => "reliable",
            BadgeType::QuickReturner => "quick_returner",
            BadgeType::NewUser => "new_user",
            BadgeType::Verified => "verified",
            BadgeType::BookCurator => "book_curator",
            BadgeType::ActiveMember => "active_member",
            BadgeType::TrustedLender => "trusted_lender",
        }
    }

    pub fn parse(key: &str) -> Option<BadgeType> {
        Self::ALL.into_iter().find(|b| b.as_str() == key)
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored badge row. Rows are never deleted; losing a badge clears `is_active`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrustBadge {
    pub id: String,
    pub user_id: String,
    /// Kept as a string so rows written by older badge sets still load
    pub badge_type: String,
    pub earned_date: DateTime<Utc>,
    pub is_active: bool,
}
