//! Display metadata for badges and trust levels.
//!
//! Read-only lookup tables used when rendering profiles. Nothing in here
//! influences which badges are awarded.

use crate::domain::models::badge::BadgeType;

#[derive(Debug, Clone, PartialEq)]
pub struct BadgeInfo {
    pub label: String,
    pub icon: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLevel {
    HighlyTrusted,
    Trusted,
    Reliable,
    BuildingTrust,
    UseCaution,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrustLevelInfo {
    pub level: TrustLevel,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

impl TrustLevel {
    pub fn for_score(trust_score: f64) -> TrustLevel {
        if trust_score >= 90.0 {
            TrustLevel::HighlyTrusted
        } else if trust_score >= 75.0 {
            TrustLevel::Trusted
        } else if trust_score >= 60.0 {
            TrustLevel::Reliable
        } else if trust_score >= 45.0 {
            TrustLevel::BuildingTrust
        } else {
            TrustLevel::UseCaution
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrustLevel::HighlyTrusted => "highly_trusted",
            TrustLevel::Trusted => "trusted",
            TrustLevel::Reliable => "reliable",
            TrustLevel::BuildingTrust => "building_trust",
            TrustLevel::UseCaution => "use_caution",
        }
    }
}

pub fn trust_level_info(trust_score: f64) -> TrustLevelInfo {
    let level = TrustLevel::for_score(trust_score);
    let (label, color, icon, description) = match level {
        TrustLevel::HighlyTrusted => (
            "Highly Trusted",
            "#4CAF50",
            "shield-checkmark",
            "Exceptional track record with the community",
        ),
        TrustLevel::Trusted => (
            "Trusted",
            "#2196F3",
            "shield",
            "Reliable member with good history",
        ),
        TrustLevel::Reliable => (
            "Reliable",
            "#FF9800",
            "shield-outline",
            "Generally dependable member",
        ),
        TrustLevel::BuildingTrust => (
            "Building Trust",
            "#FFC107",
            "hourglass",
            "New member building reputation",
        ),
        TrustLevel::UseCaution => (
            "Use Caution",
            "#F44336",
            "warning",
            "Limited history or concerning patterns",
        ),
    };

    TrustLevelInfo {
        level,
        label,
        color,
        icon,
        description,
    }
}

/// Look up display info for a badge key. Unknown keys get a generic entry
/// whose label is the key in title case.
pub fn badge_info(badge_type: &str) -> BadgeInfo {
    let Some(badge) = BadgeType::parse(badge_type) else {
        return BadgeInfo {
            label: title_case(badge_type),
            icon: "ribbon",
            color: "#9E9E9E",
            description: "Special recognition",
        };
    };

    let (label, icon, color, description) = match badge {
        BadgeType::Reliable => (
            "Reliable",
            "shield-checkmark",
            "#4CAF50",
            "4.5+ rating with 10+ transactions",
        ),
        BadgeType::QuickReturner => ("Quick Returner", "time", "#2196F3", "90%+ on-time returns"),
        BadgeType::NewUser => ("New User", "person-add", "#FF9800", "New to the community"),
        BadgeType::Verified => ("Verified", "checkmark-circle", "#9C27B0", "Verified account"),
        BadgeType::BookCurator => ("Book Curator", "library", "#795548", "20+ books listed"),
        BadgeType::ActiveMember => (
            "Active Member",
            "star",
            "#FF5722",
            "50+ transactions completed",
        ),
        BadgeType::TrustedLender => (
            "Trusted Lender",
            "hand-left",
            "#607D8B",
            "4.8+ rating as lender",
        ),
    };

    BadgeInfo {
        label: label.to_string(),
        icon,
        color,
        description,
    }
}

/// "super_star_lender" -> "Super Star Lender"
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
